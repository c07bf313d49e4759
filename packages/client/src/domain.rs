//! Reconnect policy.
//!
//! Pure functions deciding what the engine does after a transport failure.

use crate::error::ClientError;

/// Check if the error ends the session instead of triggering a reconnect.
///
/// A duplicate participant id would be rejected again on every attempt.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::DuplicateParticipantId(_) | ClientError::InvalidConfig(_)
    )
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The error that closed or prevented the connection
/// * `current_attempt` - Reconnect attempts made since the last successful connection
/// * `max_attempts` - The attempt limit, `None` for unlimited
///
/// # Returns
///
/// `true` if reconnection should be attempted, `false` otherwise
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: Option<u32>,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    match max_attempts {
        Some(max) => current_attempt < max,
        None => true,
    }
}

/// Check if a duplicate participant id is this client's own previous session.
///
/// After a successful connection the relay may still hold the old socket until
/// its idle timeout reaps it, so the id is taken by ourselves and retrying
/// will succeed.
pub fn is_own_stale_session(error: &ClientError, has_connected: bool) -> bool {
    has_connected && matches!(error, ClientError::DuplicateParticipantId(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_exit_immediately_with_duplicate_participant_id() {
        // テスト項目: DuplicateParticipantId エラーの場合、即座に終了すべきと判定される
        // given (前提条件):
        let error = ClientError::DuplicateParticipantId("alice".to_string());

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_exit_immediately_with_connection_error() {
        // テスト項目: ConnectionError の場合、即座に終了すべきではないと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_should_attempt_reconnect_with_duplicate_participant_id() {
        // テスト項目: DuplicateParticipantId エラーの場合、上限なしでも再接続しない
        // given (前提条件):
        let error = ClientError::DuplicateParticipantId("alice".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 0, None);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_should_attempt_reconnect_without_limit() {
        // テスト項目: 上限なしの場合、何回目でも再接続すべきと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 1_000, None);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_attempt_reconnect_within_limit() {
        // テスト項目: 再接続回数が上限未満の場合、再接続すべきと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 4, Some(5));

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_attempt_reconnect_at_limit() {
        // テスト項目: 再接続回数が上限に達した場合、再接続すべきではないと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 5, Some(5));

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_duplicate_after_successful_connection_is_own_session() {
        // テスト項目: 一度接続に成功した後の DuplicateParticipantId は自分の古いセッションと判定される
        // given (前提条件):
        let error = ClientError::DuplicateParticipantId("alice".to_string());

        // when (操作):
        let resumed = is_own_stale_session(&error, true);
        let first = is_own_stale_session(&error, false);

        // then (期待する結果):
        assert!(resumed);
        assert!(!first);
    }

    #[test]
    fn test_connection_error_is_not_stale_session() {
        // テスト項目: DuplicateParticipantId 以外のエラーは古いセッションとは判定されない
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = is_own_stale_session(&error, true);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_rejected_id_is_not_retried() {
        // テスト項目: リレーに拒否された ID（InvalidConfig）は上限なしでも再接続しない
        // given (前提条件):
        let error = ClientError::InvalidConfig("the relay rejected the id".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 0, None);

        // then (期待する結果):
        assert!(!result);
    }
}
