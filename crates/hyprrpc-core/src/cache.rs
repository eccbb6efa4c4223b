//! ApplicationCache - 「現在存在する」アプリの正本
//!
//! # 学習ポイント
//! - 順序付きコレクション + address によるユニーク制約
//! - `checkout()` は純粋関数（cache を変更しない）
//! - 外部に見せるのはフィルタ済みのコピーだけ（read-only projection）

use crate::domain::{Address, App};

/// ApplicationCache は App を登録順に保持する
///
/// # Invariant
/// - 同じ address の App は高々 1 つ
#[derive(Debug, Default)]
pub struct ApplicationCache {
    apps: Vec<App>,
}

impl ApplicationCache {
    pub fn new() -> Self {
        Self { apps: Vec::new() }
    }

    pub fn has_application(&self, address: &Address) -> bool {
        self.apps.iter().any(|a| a.address() == address)
    }

    /// address が未登録なら追加して `true`、登録済みなら何もせず `false`
    pub fn push_application(&mut self, app: App) -> bool {
        if self.has_application(app.address()) {
            return false;
        }
        self.apps.push(app);
        true
    }

    /// address が登録済みなら削除して `true`、未登録なら `false`
    pub fn purge_application(&mut self, address: &Address) -> bool {
        match self.apps.iter().position(|a| a.address() == address) {
            Some(index) => {
                self.apps.remove(index);
                true
            }
            None => false,
        }
    }

    /// Identity-preserving merge of fresh candidates against the cache.
    ///
    /// A candidate whose address is already cached is replaced by the cached
    /// app; everything else passes through unchanged. Order follows
    /// `candidates`.
    pub fn checkout(&self, candidates: Vec<App>) -> Vec<App> {
        candidates
            .into_iter()
            .map(|candidate| self.get(candidate.address()).cloned().unwrap_or(candidate))
            .collect()
    }

    pub fn get(&self, address: &Address) -> Option<&App> {
        self.apps.iter().find(|a| a.address() == address)
    }

    /// Every stored app, including entries hidden from consumers.
    pub fn iter(&self) -> impl Iterator<Item = &App> {
        self.apps.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut App> {
        self.apps.iter_mut()
    }

    /// 外部向けのビュー
    ///
    /// title が空、または pid が sentinel の App は除外します。
    /// 返り値はコピーなので、変更しても cache には影響しません。
    pub fn cached_applications(&self) -> Vec<App> {
        self.apps
            .iter()
            .filter(|a| a.is_presentable())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}
