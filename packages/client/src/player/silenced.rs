//! Silent commands.
//!
//! Commands issued by the engine produce the same element events as a user
//! would. Each silent command is recorded in [`PendingCommands`] and swallows
//! exactly one matching event; everything else is reported as user intent.

use std::{
    collections::{HashMap, VecDeque},
    time::{Duration, Instant},
};

use super::{MediaElement, MediaEvent, PlayerStatus, UserIntent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Play,
    Pause,
    Seek,
}

/// Issued silent commands waiting for their element event
#[derive(Debug)]
pub struct PendingCommands {
    ttl: Duration,
    queues: HashMap<CommandKind, VecDeque<Instant>>,
}

impl PendingCommands {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            queues: HashMap::new(),
        }
    }

    pub fn issue(&mut self, kind: CommandKind, now: Instant) {
        self.queues.entry(kind).or_default().push_back(now);
    }

    /// Match an observed event against the oldest live command of its kind.
    ///
    /// Entries older than the TTL are dropped first, so a command whose event
    /// never fired cannot swallow a later user action.
    pub fn consume(&mut self, kind: CommandKind, now: Instant) -> bool {
        let Some(queue) = self.queues.get_mut(&kind) else {
            return false;
        };
        while let Some(issued) = queue.front() {
            if now.saturating_duration_since(*issued) > self.ttl {
                tracing::debug!("Silent {:?} expired without an event", kind);
                queue.pop_front();
            } else {
                break;
            }
        }
        queue.pop_front().is_some()
    }

    pub fn pending(&self, kind: CommandKind) -> usize {
        self.queues.get(&kind).map_or(0, VecDeque::len)
    }

    pub fn clear(&mut self) {
        self.queues.clear();
    }
}

/// A media element whose engine-issued commands are not mistaken for user input
pub struct SilencedPlayer<E> {
    element: E,
    pending: PendingCommands,
    buffering: bool,
    media_index: Option<u32>,
}

impl<E: MediaElement> SilencedPlayer<E> {
    pub fn new(element: E, ttl: Duration) -> Self {
        Self {
            element,
            pending: PendingCommands::new(ttl),
            buffering: false,
            media_index: None,
        }
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn status(&self) -> PlayerStatus {
        self.element.status()
    }

    /// Index of the loaded source, `None` before the first swap
    pub fn media_index(&self) -> Option<u32> {
        self.media_index
    }

    pub fn pending(&self) -> &PendingCommands {
        &self.pending
    }

    pub fn silent_play(&mut self) {
        // A playing element fires no event for play()
        if self.element.status().paused {
            self.pending.issue(CommandKind::Play, Instant::now());
            self.element.play();
        }
    }

    pub fn silent_pause(&mut self) {
        if !self.element.status().paused {
            self.pending.issue(CommandKind::Pause, Instant::now());
            self.element.pause();
        }
    }

    pub fn silent_seek(&mut self, time: f64) {
        self.pending.issue(CommandKind::Seek, Instant::now());
        self.element.seek(time);
    }

    /// Replace the loaded media
    pub fn swap_source(&mut self, media_index: u32, source: &str) {
        self.pending.clear();
        self.element.load_source(source);
        self.media_index = Some(media_index);
    }

    /// Translate an element event into user intent, or swallow it
    pub fn observe(&mut self, event: MediaEvent) -> Option<UserIntent> {
        self.observe_at(event, Instant::now())
    }

    fn observe_at(&mut self, event: MediaEvent, now: Instant) -> Option<UserIntent> {
        match event {
            MediaEvent::Play => {
                (!self.pending.consume(CommandKind::Play, now)).then_some(UserIntent::Play)
            }
            MediaEvent::Pause => {
                (!self.pending.consume(CommandKind::Pause, now)).then_some(UserIntent::Pause)
            }
            MediaEvent::Seeking(time) => {
                (!self.pending.consume(CommandKind::Seek, now)).then_some(UserIntent::Seek(time))
            }
            MediaEvent::Waiting => {
                if self.buffering {
                    return None;
                }
                self.buffering = true;
                Some(UserIntent::StartBuffering)
            }
            MediaEvent::CanPlay => {
                if !self.buffering {
                    return None;
                }
                self.buffering = false;
                Some(UserIntent::StopBuffering)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::SimulatedElement;

    const TTL: Duration = Duration::from_secs(2);

    #[test]
    fn test_each_command_swallows_exactly_one_event() {
        // テスト項目: 発行したコマンド 1 件につき、同種のイベントを 1 件だけ吸収する
        // given (前提条件):
        let now = Instant::now();
        let mut pending = PendingCommands::new(TTL);
        pending.issue(CommandKind::Seek, now);

        // when (操作):
        let first = pending.consume(CommandKind::Seek, now);
        let second = pending.consume(CommandKind::Seek, now);

        // then (期待する結果):
        assert!(first);
        assert!(!second);
    }

    #[test]
    fn test_kinds_are_matched_independently() {
        // テスト項目: コマンドの種類ごとに独立して照合される
        // given (前提条件):
        let now = Instant::now();
        let mut pending = PendingCommands::new(TTL);
        pending.issue(CommandKind::Pause, now);

        // when (操作):
        let play = pending.consume(CommandKind::Play, now);

        // then (期待する結果):
        assert!(!play);
        assert_eq!(pending.pending(CommandKind::Pause), 1);
    }

    #[test]
    fn test_expired_command_does_not_swallow_event() {
        // テスト項目: TTL を過ぎたコマンドは後のユーザー操作を吸収しない
        // given (前提条件):
        let issued = Instant::now();
        let mut pending = PendingCommands::new(TTL);
        pending.issue(CommandKind::Play, issued);

        // when (操作):
        let swallowed = pending.consume(CommandKind::Play, issued + Duration::from_secs(3));

        // then (期待する結果):
        assert!(!swallowed);
        assert_eq!(pending.pending(CommandKind::Play), 0);
    }

    #[test]
    fn test_overlapping_commands_are_matched_in_order() {
        // テスト項目: 重なった同種のコマンドは古いものから順に照合される
        // given (前提条件):
        let start = Instant::now();
        let mut pending = PendingCommands::new(TTL);
        pending.issue(CommandKind::Seek, start);
        pending.issue(CommandKind::Seek, start + Duration::from_millis(1500));

        // when (操作): 最初のコマンドだけが期限切れになる
        let at = start + Duration::from_millis(2500);
        let first = pending.consume(CommandKind::Seek, at);
        let second = pending.consume(CommandKind::Seek, at);

        // then (期待する結果):
        assert!(first);
        assert!(!second);
    }

    #[tokio::test]
    async fn test_silent_commands_are_not_reported_as_intent() {
        // テスト項目: サイレントコマンドによるイベントはユーザー操作として報告されない
        // given (前提条件):
        let (element, mut events) = SimulatedElement::new();
        let mut player = SilencedPlayer::new(element, TTL);

        // when (操作):
        player.silent_play();
        player.silent_seek(12.0);
        let mut intents = Vec::new();
        while let Ok(event) = events.try_recv() {
            intents.extend(player.observe(event));
        }

        // then (期待する結果):
        assert!(intents.is_empty());
        assert!(!player.status().paused);
    }

    #[tokio::test]
    async fn test_user_actions_are_reported_as_intent() {
        // テスト項目: 要素への直接操作はユーザー操作として報告される
        // given (前提条件):
        let (element, mut events) = SimulatedElement::new();
        let handle = element.clone();
        let mut player = SilencedPlayer::new(element, TTL);
        player.silent_play();

        // when (操作):
        handle.pause();
        handle.seek(30.0);
        let mut intents = Vec::new();
        while let Ok(event) = events.try_recv() {
            intents.extend(player.observe(event));
        }

        // then (期待する結果):
        assert_eq!(intents, vec![UserIntent::Pause, UserIntent::Seek(30.0)]);
    }

    #[tokio::test]
    async fn test_silent_play_on_playing_element_is_not_queued() {
        // テスト項目: 再生中の要素への silent_play はイベントが出ないため登録されない
        // given (前提条件):
        let (element, _events) = SimulatedElement::new();
        let mut player = SilencedPlayer::new(element, TTL);
        player.silent_play();
        let now = Instant::now();
        assert!(player.pending.consume(CommandKind::Play, now));

        // when (操作):
        player.silent_play();

        // then (期待する結果):
        assert_eq!(player.pending().pending(CommandKind::Play), 0);
    }

    #[tokio::test]
    async fn test_buffering_events_are_deduplicated() {
        // テスト項目: 連続した waiting / canplay は 1 回の開始・終了として扱われる
        // given (前提条件):
        let (element, _events) = SimulatedElement::new();
        let mut player = SilencedPlayer::new(element, TTL);

        // when (操作):
        let intents: Vec<_> = [
            MediaEvent::Waiting,
            MediaEvent::Waiting,
            MediaEvent::CanPlay,
            MediaEvent::CanPlay,
        ]
        .into_iter()
        .filter_map(|event| player.observe(event))
        .collect();

        // then (期待する結果):
        assert_eq!(
            intents,
            vec![UserIntent::StartBuffering, UserIntent::StopBuffering]
        );
    }

    #[tokio::test]
    async fn test_swap_source_records_index() {
        // テスト項目: ソースを切り替えると読み込んだメディアの index が記録される
        // given (前提条件):
        let (element, _events) = SimulatedElement::new();
        let mut player = SilencedPlayer::new(element, TTL);
        player.silent_seek(5.0);

        // when (操作):
        player.swap_source(1, "part2.m3u8");

        // then (期待する結果):
        assert_eq!(player.media_index(), Some(1));
        assert_eq!(player.element().source(), Some("part2.m3u8".to_string()));
        assert_eq!(player.status().current_time, 0.0);
        assert_eq!(player.pending().pending(CommandKind::Seek), 0);
    }
}
