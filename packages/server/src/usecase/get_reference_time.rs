//! UseCase: 基準時刻の取得
//!
//! クライアントは往復時間とこの時刻から自分の時計とのずれを推定する。

use std::sync::Arc;

use tandem_shared::time::Clock;

/// 基準時刻取得のユースケース
pub struct GetReferenceTimeUseCase {
    /// Clock（時刻取得の抽象化）
    clock: Arc<dyn Clock>,
}

impl GetReferenceTimeUseCase {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// 現在の基準時刻（Unix 秒）
    pub fn execute(&self) -> f64 {
        self.clock.now_secs()
    }
}
