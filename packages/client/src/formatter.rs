//! Console output formatting.

use crate::{
    engine::{EngineEvent, StatusReport},
    peers::PeerStatus,
};

const RULE: &str = "============================================================";

/// Formatter for engine notifications and status reports
pub struct StatusFormatter;

impl StatusFormatter {
    /// Format an engine notification
    ///
    /// # Arguments
    ///
    /// * `event` - The notification to display
    /// * `current_participant_id` - This client's id (to mark as "me")
    pub fn format_event(event: &EngineEvent, current_participant_id: &str) -> String {
        match event {
            EngineEvent::ClockSynced { offset } => {
                format!("\n~ clock synced (offset {:+.3}s)\n", offset)
            }
            EngineEvent::Connected => "\n~ connected\n".to_string(),
            EngineEvent::Disconnected { reason, retry_in } => match retry_in {
                Some(delay) => format!(
                    "\n! disconnected: {} (retrying in {:.1}s)\n",
                    reason,
                    delay.as_secs_f64()
                ),
                None => format!("\n! disconnected: {}\n", reason),
            },
            EngineEvent::RoomConnected { participants, .. } => {
                Self::format_room_connected(participants, current_participant_id)
            }
            EngineEvent::PeerJoined(id) => format!("\n+ {} joined\n", id),
            EngineEvent::PeerLeft(id) => format!("\n- {} left\n", id),
            EngineEvent::WaitingChanged(true) => "\n… waiting for a buffering peer\n".to_string(),
            EngineEvent::WaitingChanged(false) => "\n▶ all peers ready\n".to_string(),
            EngineEvent::MediaChanged { index, name } => {
                format!("\n♪ now playing #{} {}\n", index, name)
            }
        }
    }

    /// Format the participant list sent on connect
    pub fn format_room_connected(participants: &[String], current_participant_id: &str) -> String {
        let mut output = String::new();
        output.push_str("\n\n");
        output.push_str(RULE);
        output.push_str("\nParticipants:\n");

        if participants.is_empty() {
            output.push_str("(No participants)\n");
        } else {
            for participant in participants {
                let me_suffix = if participant == current_participant_id {
                    " (me)"
                } else {
                    ""
                };
                output.push_str(&format!("{}{}\n", participant, me_suffix));
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    pub fn format_status(report: &StatusReport) -> String {
        let mut output = String::new();
        output.push('\n');
        output.push_str(RULE);
        output.push('\n');
        output.push_str(&format!(
            "{} | {} | {}\n",
            report.participant_id,
            if report.connected {
                "connected"
            } else {
                "disconnected"
            },
            if report.synced {
                format!("clock offset {:+.3}s", report.offset)
            } else {
                "clock not synced".to_string()
            }
        ));
        output.push_str(&format!(
            "target: {} at {:.2}s (media #{}){}\n",
            play_state(report.target.paused),
            report.target.video_time,
            report.target.media_index,
            if report.waiting { ", waiting" } else { "" }
        ));
        output.push_str(&format!(
            "player: {} at {:.2}s ({}){}\n",
            play_state(report.player.paused),
            report.player.current_time,
            match report.media_index {
                Some(index) => format!("media #{}", index),
                None => "no media".to_string(),
            },
            if report.buffering { ", buffering" } else { "" }
        ));
        if report.peers.is_empty() {
            output.push_str("peers: (none)\n");
        } else {
            output.push_str("peers:\n");
            for (id, status) in &report.peers {
                output.push_str(&format!("  {} - {}\n", id, peer_state(*status)));
            }
        }
        output.push_str(RULE);
        output.push('\n');
        output
    }

    pub fn format_help() -> String {
        [
            "Commands:",
            "  play            start playback",
            "  pause           pause playback",
            "  seek <secs>     jump to a position",
            "  buffer          simulate a buffering stall",
            "  unbuffer        end the stall",
            "  media <index>   switch the room to another media item",
            "  status          show sync status",
            "  help            show this help",
            "  quit            leave the room",
        ]
        .join("\n")
            + "\n"
    }
}

fn play_state(paused: bool) -> &'static str {
    if paused { "paused" } else { "playing" }
}

fn peer_state(status: PeerStatus) -> &'static str {
    match status {
        PeerStatus::Unknown => "unknown",
        PeerStatus::Ready => "ready",
        PeerStatus::Buffering => "buffering",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{player::PlayerStatus, synchronizer::TargetState};
    use std::time::Duration;

    #[test]
    fn test_format_room_connected_marks_me() {
        // テスト項目: 参加者一覧で自分に (me) が付く
        // given (前提条件):
        let participants = vec!["alice".to_string(), "bob".to_string()];

        // when (操作):
        let output = StatusFormatter::format_room_connected(&participants, "bob");

        // then (期待する結果):
        assert!(output.contains("alice\n"));
        assert!(output.contains("bob (me)\n"));
        assert!(output.contains("Participants:"));
    }

    #[test]
    fn test_format_room_connected_empty() {
        // テスト項目: 参加者がいない場合は (No participants) と表示される
        // given (前提条件):
        let participants: Vec<String> = vec![];

        // when (操作):
        let output = StatusFormatter::format_room_connected(&participants, "alice");

        // then (期待する結果):
        assert!(output.contains("(No participants)"));
    }

    #[test]
    fn test_format_disconnected_with_retry() {
        // テスト項目: 再接続予定の切断は待ち時間付きで表示される
        // given (前提条件):
        let event = EngineEvent::Disconnected {
            reason: "Connection lost".to_string(),
            retry_in: Some(Duration::from_secs(1)),
        };

        // when (操作):
        let output = StatusFormatter::format_event(&event, "alice");

        // then (期待する結果):
        assert_eq!(
            output,
            "\n! disconnected: Connection lost (retrying in 1.0s)\n"
        );
    }

    #[test]
    fn test_format_peer_events() {
        // テスト項目: peer の参加・退出が +/- で表示される
        // given (前提条件):
        let joined = EngineEvent::PeerJoined("bob".to_string());
        let left = EngineEvent::PeerLeft("bob".to_string());

        // when (操作):
        let joined_output = StatusFormatter::format_event(&joined, "alice");
        let left_output = StatusFormatter::format_event(&left, "alice");

        // then (期待する結果):
        assert_eq!(joined_output, "\n+ bob joined\n");
        assert_eq!(left_output, "\n- bob left\n");
    }

    #[test]
    fn test_format_status() {
        // テスト項目: ステータス表示に目標・プレイヤー・peer の状態が含まれる
        // given (前提条件):
        let report = StatusReport {
            participant_id: "alice".to_string(),
            connected: true,
            synced: true,
            offset: 0.25,
            target: TargetState {
                paused: true,
                waiting: true,
                video_time: 12.0,
                media_index: 0,
            },
            player: PlayerStatus {
                paused: true,
                current_time: 12.1,
                buffering: false,
            },
            media_index: None,
            waiting: true,
            buffering: false,
            peers: vec![("carol".to_string(), PeerStatus::Buffering)],
        };

        // when (操作):
        let output = StatusFormatter::format_status(&report);

        // then (期待する結果):
        assert!(output.contains("alice | connected | clock offset +0.250s"));
        assert!(output.contains("target: paused at 12.00s (media #0), waiting"));
        assert!(output.contains("player: paused at 12.10s (no media)"));
        assert!(output.contains("  carol - buffering"));
    }
}
