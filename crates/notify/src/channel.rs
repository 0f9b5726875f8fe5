// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! `NotificationChannel`: the adapter seam `NotificationPolicy` sends
//! rendered messages through. Spec.md §1 explicitly puts "chat notification
//! delivery" out of scope, so the only shipped implementation is
//! `StdoutChannel`; a real chat/webhook channel is a drop-in behind this
//! trait, grounded in the teacher's `NotifyAdapter` (`oj-adapters::notify`).

use async_trait::async_trait;

use crate::error::NotifyError;

/// One rendered message ready to hand to a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationMessage {
    pub channel: String,
    pub text: String,
    pub event_type: String,
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError>;
}

/// Prints to stdout, prefixed by channel name. The only channel this crate
/// ships without an external integration to target.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutChannel;

#[async_trait]
impl NotificationChannel for StdoutChannel {
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        println!("[{}] {}", message.channel, message.text);
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{NotificationChannel, NotificationMessage, NotifyError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeChannel {
        sent: Arc<Mutex<Vec<NotificationMessage>>>,
    }

    impl FakeChannel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<NotificationMessage> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl NotificationChannel for FakeChannel {
        async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
            self.sent.lock().push(message.clone());
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeChannel;
