//! SysinfoProbe - sysinfo によるプロセステーブルの問い合わせ

use sysinfo::{Pid, ProcessRefreshKind, System, UpdateKind};

use crate::ports::ProcessProbe;

/// 呼び出しごとに対象 pid だけを refresh する
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoProbe;

impl SysinfoProbe {
    pub fn new() -> Self {
        Self
    }
}

fn to_pid(process_id: i32) -> Option<Pid> {
    if process_id <= 0 {
        return None;
    }
    Some(Pid::from(process_id as usize))
}

impl ProcessProbe for SysinfoProbe {
    fn is_alive(&self, process_id: i32) -> bool {
        let Some(pid) = to_pid(process_id) else {
            return false;
        };
        let mut sys = System::new();
        sys.refresh_process_specifics(pid, ProcessRefreshKind::new())
    }

    fn binary_path(&self, process_id: i32) -> Option<String> {
        let pid = to_pid(process_id)?;
        let mut sys = System::new();
        sys.refresh_process_specifics(
            pid,
            ProcessRefreshKind::new().with_exe(UpdateKind::OnlyIfNotSet),
        );
        sys.process(pid)
            .and_then(|process| process.exe())
            .map(|path| path.display().to_string())
    }
}
