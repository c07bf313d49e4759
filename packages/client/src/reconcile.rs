//! Player reconciliation.
//!
//! Compares what the element is doing with the synchronizer's target and
//! plans the silent commands that close the gap. Planning is pure; the engine
//! applies the corrections.

use crate::{player::PlayerStatus, synchronizer::TargetState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    /// Load the source of the given media index
    SwapSource { index: u32 },
    /// Entered the "waiting on peer" state
    StartWaiting,
    /// Left the "waiting on peer" state
    StopWaiting,
    Pause,
    Play,
    Seek(f64),
}

pub struct PlayerReconciler {
    tolerance: f64,
    waiting: bool,
}

impl PlayerReconciler {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            waiting: false,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// Corrections for one tick, in the order they must be applied
    pub fn plan(
        &mut self,
        local: &PlayerStatus,
        local_media_index: Option<u32>,
        target: &TargetState,
    ) -> Vec<Correction> {
        let mut corrections = Vec::new();
        let mut local = *local;

        if local_media_index != Some(target.media_index) {
            corrections.push(Correction::SwapSource {
                index: target.media_index,
            });
            // A freshly loaded source is paused at the start
            local.paused = true;
            local.current_time = 0.0;
        }

        if target.waiting {
            if !self.waiting {
                self.waiting = true;
                corrections.push(Correction::StartWaiting);
            }
            if !local.paused {
                corrections.push(Correction::Pause);
            }
            return corrections;
        }
        if self.waiting {
            self.waiting = false;
            corrections.push(Correction::StopWaiting);
        }

        if target.paused && !local.paused {
            corrections.push(Correction::Pause);
        } else if !target.paused && local.paused {
            corrections.push(Correction::Play);
        }

        if (local.current_time - target.video_time).abs() > self.tolerance {
            corrections.push(Correction::Seek(target.video_time));
        }

        corrections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(paused: bool, current_time: f64) -> PlayerStatus {
        PlayerStatus {
            paused,
            current_time,
            buffering: false,
        }
    }

    fn target(paused: bool, waiting: bool, video_time: f64) -> TargetState {
        TargetState {
            paused,
            waiting,
            video_time,
            media_index: 0,
        }
    }

    #[test]
    fn test_in_sync_player_needs_nothing() {
        // テスト項目: 目標と一致している場合は何もしない
        // given (前提条件):
        let mut reconciler = PlayerReconciler::new(0.5);

        // when (操作):
        let corrections = reconciler.plan(&status(false, 10.2), Some(0), &target(false, false, 10.0));

        // then (期待する結果):
        assert!(corrections.is_empty());
    }

    #[test]
    fn test_play_state_is_corrected() {
        // テスト項目: 再生・一時停止の不一致が修正される
        // given (前提条件):
        let mut reconciler = PlayerReconciler::new(0.5);

        // when (操作):
        let to_pause = reconciler.plan(&status(false, 3.0), Some(0), &target(true, false, 3.0));
        let to_play = reconciler.plan(&status(true, 3.0), Some(0), &target(false, false, 3.0));

        // then (期待する結果):
        assert_eq!(to_pause, vec![Correction::Pause]);
        assert_eq!(to_play, vec![Correction::Play]);
    }

    #[test]
    fn test_drift_beyond_tolerance_is_sought() {
        // テスト項目: 許容範囲を超えたずれはシークで修正される
        // given (前提条件):
        let mut reconciler = PlayerReconciler::new(0.5);

        // when (操作):
        let within = reconciler.plan(&status(true, 20.4), Some(0), &target(true, false, 20.0));
        let beyond = reconciler.plan(&status(true, 20.6), Some(0), &target(true, false, 20.0));

        // then (期待する結果):
        assert!(within.is_empty());
        assert_eq!(beyond, vec![Correction::Seek(20.0)]);
    }

    #[test]
    fn test_waiting_pauses_and_skips_other_checks() {
        // テスト項目: 待機中は一時停止だけを行い、シークなどの修正は行わない
        // given (前提条件):
        let mut reconciler = PlayerReconciler::new(0.5);

        // when (操作):
        let first = reconciler.plan(&status(false, 50.0), Some(0), &target(true, true, 10.0));
        let second = reconciler.plan(&status(true, 50.0), Some(0), &target(true, true, 10.0));

        // then (期待する結果):
        assert_eq!(first, vec![Correction::StartWaiting, Correction::Pause]);
        assert!(second.is_empty());
        assert!(reconciler.is_waiting());
    }

    #[test]
    fn test_waiting_ends_with_resume() {
        // テスト項目: 待機が終わると通知し、再生を再開する
        // given (前提条件):
        let mut reconciler = PlayerReconciler::new(0.5);
        reconciler.plan(&status(false, 5.0), Some(0), &target(true, true, 5.0));

        // when (操作):
        let corrections = reconciler.plan(&status(true, 5.0), Some(0), &target(false, false, 5.0));

        // then (期待する結果):
        assert_eq!(corrections, vec![Correction::StopWaiting, Correction::Play]);
        assert!(!reconciler.is_waiting());
    }

    #[test]
    fn test_media_mismatch_swaps_source_then_catches_up() {
        // テスト項目: メディアが異なる場合はシークではなくソースを切り替え、その後位置を合わせる
        // given (前提条件):
        let mut reconciler = PlayerReconciler::new(0.5);
        let mut goal = target(false, false, 4.0);
        goal.media_index = 2;

        // when (操作):
        let corrections = reconciler.plan(&status(false, 100.0), Some(1), &goal);

        // then (期待する結果):
        assert_eq!(
            corrections,
            vec![
                Correction::SwapSource { index: 2 },
                Correction::Play,
                Correction::Seek(4.0),
            ]
        );
    }

    #[test]
    fn test_unloaded_player_swaps_source() {
        // テスト項目: まだ何も読み込んでいないプレイヤーにはソースを読み込む
        // given (前提条件):
        let mut reconciler = PlayerReconciler::new(0.5);

        // when (操作):
        let corrections = reconciler.plan(&status(true, 0.0), None, &target(true, false, 0.0));

        // then (期待する結果):
        assert_eq!(corrections, vec![Correction::SwapSource { index: 0 }]);
    }
}
