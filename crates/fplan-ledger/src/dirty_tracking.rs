//! 髒標記追蹤

use fplan_core::WeekLabel;
use parking_lot::Mutex;
use std::collections::BTreeSet;

#[derive(Debug, Default)]
struct Marks {
    pieces: BTreeSet<String>,
    machine_weeks: BTreeSet<(String, WeekLabel)>,
}

/// 髒標記追蹤器（物料與機台週）
#[derive(Debug, Default)]
pub struct DirtyTracker {
    marks: Mutex<Marks>,
}

impl DirtyTracker {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 標記物料為髒
    pub fn mark_piece(&self, piece_id: &str) {
        self.marks.lock().pieces.insert(piece_id.to_string());
    }

    /// 標記機台週為髒
    pub fn mark_machine_week(&self, machine_id: &str, week: WeekLabel) {
        self.marks
            .lock()
            .machine_weeks
            .insert((machine_id.to_string(), week));
    }

    /// 檢查物料是否為髒
    pub fn is_dirty(&self, piece_id: &str) -> bool {
        self.marks.lock().pieces.contains(piece_id)
    }

    pub fn has_changes(&self) -> bool {
        let marks = self.marks.lock();
        !marks.pieces.is_empty() || !marks.machine_weeks.is_empty()
    }

    /// 獲取所有髒物料（依ID排序）
    pub fn dirty_pieces(&self) -> Vec<String> {
        self.marks.lock().pieces.iter().cloned().collect()
    }

    pub fn dirty_machine_weeks(&self) -> Vec<(String, WeekLabel)> {
        self.marks.lock().machine_weeks.iter().cloned().collect()
    }

    /// 取出並清除所有髒物料
    pub fn take_pieces(&self) -> Vec<String> {
        std::mem::take(&mut self.marks.lock().pieces)
            .into_iter()
            .collect()
    }

    /// 清除所有髒標記
    pub fn clear(&self) {
        let mut marks = self.marks.lock();
        marks.pieces.clear();
        marks.machine_weeks.clear();
    }
}
