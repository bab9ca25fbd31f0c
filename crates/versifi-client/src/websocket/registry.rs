//! 토픽별 메시지 핸들러 레지스트리.

use super::codec::WILDCARD;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

/// 토픽 메시지 핸들러. 프레임의 원시 바이트를 받습니다.
pub type MessageHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// 토픽 이름 → 핸들러 매핑.
///
/// 핸들러는 잠금 밖에서 호출되므로 핸들러 안에서 레지스트리를 수정해도 됩니다.
#[derive(Default)]
pub struct TopicRegistry {
    handlers: RwLock<HashMap<String, MessageHandler>>,
}

impl TopicRegistry {
    /// 빈 레지스트리 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 핸들러를 등록합니다. 기존 핸들러가 있으면 교체하고 반환합니다.
    pub fn register(
        &self,
        topic: impl Into<String>,
        handler: MessageHandler,
    ) -> Option<MessageHandler> {
        self.write().insert(topic.into(), handler)
    }

    /// 핸들러를 제거합니다.
    pub fn unregister(&self, topic: &str) -> bool {
        self.write().remove(topic).is_some()
    }

    /// 토픽의 핸들러.
    pub fn lookup(&self, topic: &str) -> Option<MessageHandler> {
        self.read().get(topic).cloned()
    }

    /// 와일드카드 핸들러.
    pub fn wildcard(&self) -> Option<MessageHandler> {
        self.lookup(WILDCARD)
    }

    /// 등록된 토픽 목록 (이름순).
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.read().keys().cloned().collect();
        topics.sort();
        topics
    }

    /// 등록된 핸들러 수.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// 비어 있는지 확인.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// 토픽 핸들러, 그다음 와일드카드 핸들러 순으로 호출합니다.
    ///
    /// 호출된 핸들러 수를 반환합니다. 등록되지 않은 토픽은 와일드카드만 받습니다.
    pub fn dispatch(&self, topic: &str, raw: &[u8]) -> usize {
        let (specific, wildcard) = {
            let handlers = self.read();
            let specific = if topic == WILDCARD {
                None
            } else {
                handlers.get(topic).cloned()
            };
            (specific, handlers.get(WILDCARD).cloned())
        };

        let mut invoked = 0;
        for handler in [specific, wildcard].into_iter().flatten() {
            handler(raw);
            invoked += 1;
        }
        invoked
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, MessageHandler>> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, MessageHandler>> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 느린 핸들러를 제한된 큐와 전용 워커 태스크로 감쌉니다.
///
/// 수신 루프는 큐에 넣기만 하고 기다리지 않습니다. 큐가 가득 차면 프레임을 버리고
/// 경고를 남깁니다. Tokio 런타임 안에서 호출해야 합니다.
pub fn queued_handler<F>(capacity: usize, handler: F) -> impl Fn(&[u8]) + Send + Sync + 'static
where
    F: Fn(&[u8]) + Send + 'static,
{
    let capacity = capacity.max(1);
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(capacity);

    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            handler(&frame);
        }
    });

    move |raw: &[u8]| match tx.try_send(raw.to_vec()) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            warn!(capacity, "Handler queue full, dropping frame");
        }
        Err(TrySendError::Closed(_)) => {
            warn!("Handler worker stopped, dropping frame");
        }
    }
}
