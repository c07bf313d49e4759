//! 値オブジェクト（Value Object）
//!
//! ルーム ID・参加者 ID・タイムスタンプを型で区別し、
//! 不正な値がドメイン層に入り込まないようにします。

use std::fmt;

use super::error::ValueObjectError;

/// ID の最大文字数
pub const MAX_ID_LENGTH: usize = 64;

fn validate_id(value: &str) -> Result<(), ValueObjectError> {
    if value.is_empty() {
        return Err(ValueObjectError::Empty);
    }
    let length = value.chars().count();
    if length > MAX_ID_LENGTH {
        return Err(ValueObjectError::TooLong {
            max: MAX_ID_LENGTH,
            actual: length,
        });
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(ValueObjectError::InvalidCharacter(c));
    }
    Ok(())
}

/// ルーム ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_id(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 参加者 ID（1 接続につき 1 つ、ルーム内で一意）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_id(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 参加者 ID の生成（クライアントが ID を指定しなかった場合に使用）
pub struct ParticipantIdFactory;

impl ParticipantIdFactory {
    /// UUID v4 を元に参加者 ID を生成
    pub fn generate() -> Result<ParticipantId, ValueObjectError> {
        ParticipantId::new(uuid::Uuid::new_v4().to_string())
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_accepts_valid_value() {
        // テスト項目: 英数字・ハイフン・アンダースコアからなる ID は受け入れられる
        // given (前提条件):
        let value = "movie-night_01".to_string();

        // when (操作):
        let result = RoomId::new(value);

        // then (期待する結果):
        assert_eq!(result.unwrap().as_str(), "movie-night_01");
    }

    #[test]
    fn test_room_id_rejects_empty_value() {
        // テスト項目: 空文字列の ID はエラーになる
        // given (前提条件):
        let value = String::new();

        // when (操作):
        let result = RoomId::try_from(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::Empty));
    }

    #[test]
    fn test_participant_id_rejects_too_long_value() {
        // テスト項目: 最大文字数を超える ID はエラーになる
        // given (前提条件):
        let value = "a".repeat(MAX_ID_LENGTH + 1);

        // when (操作):
        let result = ParticipantId::new(value);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueObjectError::TooLong {
                max: MAX_ID_LENGTH,
                actual: MAX_ID_LENGTH + 1
            })
        );
    }

    #[test]
    fn test_participant_id_rejects_invalid_character() {
        // テスト項目: 許可されていない文字を含む ID はエラーになる
        // given (前提条件):
        let value = "alice bob".to_string();

        // when (操作):
        let result = ParticipantId::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::InvalidCharacter(' ')));
    }

    #[test]
    fn test_participant_id_factory_generates_valid_ids() {
        // テスト項目: ParticipantIdFactory が毎回異なる有効な ID を生成する
        // given (前提条件):

        // when (操作):
        let first = ParticipantIdFactory::generate().unwrap();
        let second = ParticipantIdFactory::generate().unwrap();

        // then (期待する結果):
        assert_ne!(first, second);
        assert_eq!(first.as_str().len(), 36);
    }
}
