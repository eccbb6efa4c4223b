//! 公開 API だけを使ったライフサイクルの通しテスト

use std::sync::{Arc, Mutex};
use std::time::Duration;

use hyprrpc_core::domain::ClientRecord;
use hyprrpc_core::impls::{ManualClock, MemorySource, ScriptedProbe};
use hyprrpc_core::{Address, EventKind, LifecycleEvent, ManagerBuilder, ManagerConfig};

fn record_events(manager: &hyprrpc_core::Manager) -> Arc<Mutex<Vec<String>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for kind in EventKind::ALL {
        manager.connect_fn(kind, {
            let log = Arc::clone(&log);
            move |event: &LifecycleEvent| {
                let entry = match event {
                    LifecycleEvent::ApplicationIn { app } => format!("in:{}", app.address()),
                    LifecycleEvent::ApplicationOut { purged } => format!("out:{}", purged.len()),
                    LifecycleEvent::Endangered { app, remaining } => {
                        format!("endangered:{}:{remaining}", app.address())
                    }
                    LifecycleEvent::Update { refreshed, .. } => format!("update:{refreshed}"),
                };
                log.lock().unwrap().push(entry);
            }
        });
    }
    log
}

#[tokio::test]
async fn window_opens_lives_and_closes() {
    let source = Arc::new(MemorySource::new(vec![ClientRecord::new("0xa", 100, "editor").with_class("code")]));
    let probe = Arc::new(ScriptedProbe::new());
    let clock = Arc::new(ManualClock::new(0));
    probe.spawn(100, "/usr/bin/code");

    let manager = ManagerBuilder::new(source.clone(), probe.clone())
        .clock(clock.clone())
        .config(ManagerConfig::default())
        .build()
        .unwrap();
    let events = record_events(&manager);

    // startup: registered silently
    assert_eq!(manager.bootstrap().await.unwrap(), 1);
    assert!(events.lock().unwrap().is_empty());

    // a terminal opens
    probe.spawn(200, "/usr/bin/kitty");
    source.set(vec![
        ClientRecord::new("0xa", 100, "editor").with_class("code"),
        ClientRecord::new("0xb", 200, "shell").with_class("kitty"),
    ]);
    manager.sweep().await.unwrap();
    assert_eq!(manager.scan_and_register().await.unwrap(), 1);

    // the editor renames its window
    clock.advance_ms(10_000);
    source.set(vec![
        ClientRecord::new("0xa", 100, "editor - main.rs").with_class("code"),
        ClientRecord::new("0xb", 200, "shell").with_class("kitty"),
    ]);
    manager.update().await.unwrap();
    let apps = manager.registered_apps().await;
    assert_eq!(apps[0].title(), "editor - main.rs");
    assert_eq!(apps[0].binary_path(), "/usr/bin/code");
    assert_eq!(
        manager.uptime(&Address::from("0xa")).await.unwrap(),
        Duration::from_secs(10)
    );

    // the terminal exits and disappears from the compositor
    probe.kill(200);
    source.set(vec![ClientRecord::new("0xa", 100, "editor - main.rs").with_class("code")]);
    for _ in 0..5 {
        manager.sweep().await.unwrap();
        manager.scan_and_register().await.unwrap();
    }

    let apps = manager.registered_apps().await;
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0].address(), &Address::from("0xa"));
    // first-seen time outlives the eviction
    assert!(manager.first_seen(&Address::from("0xb")).await.is_ok());

    let events = events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "in:0xb".to_string(),
            "update:2".to_string(),
            "endangered:0xb:3".to_string(),
            "out:1".to_string(),
        ]
    );
}

#[tokio::test]
async fn reopened_window_is_registered_again() {
    let source = Arc::new(MemorySource::new(vec![ClientRecord::new("0xa", 100, "a")]));
    let probe = Arc::new(ScriptedProbe::new());
    probe.spawn(100, "/bin/a");
    let manager = ManagerBuilder::new(source.clone(), probe.clone())
        .config(ManagerConfig {
            max_rpc_timeout: 0,
            ..ManagerConfig::default()
        })
        .build()
        .unwrap();
    let events = record_events(&manager);
    manager.bootstrap().await.unwrap();

    probe.kill(100);
    source.set(Vec::new());
    manager.sweep().await.unwrap();
    manager.sweep().await.unwrap();
    assert!(manager.registered_apps().await.is_empty());

    probe.spawn(100, "/bin/a");
    source.set(vec![ClientRecord::new("0xa", 100, "a")]);
    manager.sweep().await.unwrap();
    manager.scan_and_register().await.unwrap();

    assert_eq!(manager.registered_apps().await.len(), 1);
    assert!(!manager.is_endangered(&Address::from("0xa")).await);
    assert_eq!(events.lock().unwrap().last().map(String::as_str), Some("in:0xa"));
}

#[tokio::test]
async fn initialize_runs_until_cleanup() {
    let source = Arc::new(MemorySource::new(vec![ClientRecord::new("0xa", 100, "a")]));
    let probe = Arc::new(ScriptedProbe::new());
    probe.spawn(100, "/bin/a");
    let manager = ManagerBuilder::new(source.clone(), probe.clone())
        .config(ManagerConfig {
            scan_period_ms: 50,
            ..ManagerConfig::default()
        })
        .build()
        .unwrap();

    let runner = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.initialize().await }
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(manager.is_bootstrapped().await);
    assert!(manager.initialize().await.is_err());

    manager.cleanup();
    let report = tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(report.cycles >= 2);
    assert!(manager.is_shutdown_requested());
}

#[tokio::test]
async fn binaryless_entries_are_ignored_and_dead_apps_expire() {
    let source = Arc::new(MemorySource::new(vec![
        ClientRecord::new("A", 10, "app a"),
        ClientRecord::new("B", 11, "app b"),
    ]));
    let probe = Arc::new(ScriptedProbe::new());
    probe.spawn(10, "/bin/x");
    probe.spawn(11, "");
    let manager = ManagerBuilder::new(source.clone(), probe.clone()).build().unwrap();
    let events = record_events(&manager);

    manager.bootstrap().await.unwrap();
    let apps = manager.registered_apps().await;
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0].address(), &Address::from("A"));

    probe.kill(10);
    manager.sweep().await.unwrap();
    let a = Address::from("A");
    assert!(manager.is_endangered(&a).await);
    assert_eq!(manager.grace_remaining(&a).await, Some(3));
    assert_eq!(manager.registered_apps().await.len(), 1);

    for _ in 0..4 {
        manager.sweep().await.unwrap();
    }

    assert!(manager.registered_apps().await.is_empty());
    assert_eq!(
        events.lock().unwrap().clone(),
        vec!["endangered:A:3".to_string(), "out:1".to_string()]
    );
}
