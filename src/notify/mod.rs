// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Change fanout. Services publish one payload-free signal per committed mutation;
//! transports subscribe and forward the signal name to their clients.

pub mod ws;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

const SIGNAL_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChangeSignal {
    ArticlesChanged,
    CategoriesChanged,
    TagsChanged,
    AccountsChanged,
}

impl ChangeSignal {
    pub fn name(self) -> &'static str {
        match self {
            ChangeSignal::ArticlesChanged => "ArticlesChanged",
            ChangeSignal::CategoriesChanged => "CategoriesChanged",
            ChangeSignal::TagsChanged => "TagsChanged",
            ChangeSignal::AccountsChanged => "AccountsChanged",
        }
    }
}

impl std::fmt::Display for ChangeSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<ChangeSignal>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SIGNAL_BUFFER);
        Self { sender }
    }

    /// Best effort. Having nobody listening is normal.
    pub fn publish(&self, signal: ChangeSignal) {
        match self.sender.send(signal) {
            Ok(listeners) => log::debug!("{} sent to {} listener(s)", signal, listeners),
            Err(_) => log::trace!("{} dropped: no listeners", signal),
        }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Subscription {
    receiver: broadcast::Receiver<ChangeSignal>,
}

impl Subscription {
    /// Next signal, skipping over any this subscriber was too slow to receive.
    /// `None` once the notifier is gone.
    pub async fn next(&mut self) -> Option<ChangeSignal> {
        loop {
            match self.receiver.recv().await {
                Ok(signal) => return Some(signal),
                Err(RecvError::Lagged(missed)) => {
                    log::debug!("Change subscriber skipped {} signal(s)", missed);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Somewhere a signal can be pushed to, such as an open websocket. Sinks live on
/// the worker that accepted them, so their futures need not be `Send`.
#[async_trait(?Send)]
pub trait SignalSink {
    async fn deliver(&mut self, signal: ChangeSignal) -> Result<(), String>;
}

/// Forwards signals to `sink` until either side goes away.
pub async fn relay(mut subscription: Subscription, sink: &mut dyn SignalSink) {
    while let Some(signal) = subscription.next().await {
        if let Err(err) = sink.deliver(signal).await {
            log::debug!("Change relay stopped: {}", err);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collect {
        seen: Vec<ChangeSignal>,
        limit: usize,
    }

    #[async_trait(?Send)]
    impl SignalSink for Collect {
        async fn deliver(&mut self, signal: ChangeSignal) -> Result<(), String> {
            self.seen.push(signal);
            if self.seen.len() >= self.limit {
                return Err("full".to_string());
            }
            Ok(())
        }
    }

    #[test]
    fn publishing_without_listeners_is_fine() {
        let notifier = ChangeNotifier::new();
        notifier.publish(ChangeSignal::TagsChanged);
        assert_eq!(notifier.listener_count(), 0);
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_signal() {
        let notifier = ChangeNotifier::new();
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        notifier.publish(ChangeSignal::ArticlesChanged);
        notifier.publish(ChangeSignal::AccountsChanged);

        for subscription in [&mut first, &mut second] {
            assert_eq!(subscription.next().await, Some(ChangeSignal::ArticlesChanged));
            assert_eq!(subscription.next().await, Some(ChangeSignal::AccountsChanged));
        }
    }

    #[tokio::test]
    async fn slow_subscriber_skips_ahead() {
        let notifier = ChangeNotifier::new();
        let mut subscription = notifier.subscribe();
        for _ in 0..SIGNAL_BUFFER + 5 {
            notifier.publish(ChangeSignal::TagsChanged);
        }
        notifier.publish(ChangeSignal::CategoriesChanged);

        let mut last = None;
        for _ in 0..SIGNAL_BUFFER {
            last = subscription.next().await;
        }
        assert_eq!(last, Some(ChangeSignal::CategoriesChanged));
    }

    #[tokio::test]
    async fn relay_stops_when_sink_fails() {
        let notifier = ChangeNotifier::new();
        let subscription = notifier.subscribe();
        notifier.publish(ChangeSignal::CategoriesChanged);
        notifier.publish(ChangeSignal::TagsChanged);
        notifier.publish(ChangeSignal::ArticlesChanged);

        let mut sink = Collect {
            seen: Vec::new(),
            limit: 2,
        };
        relay(subscription, &mut sink).await;
        assert_eq!(
            sink.seen,
            vec![ChangeSignal::CategoriesChanged, ChangeSignal::TagsChanged]
        );
    }

    #[test]
    fn names_match_the_wire_format() {
        assert_eq!(ChangeSignal::ArticlesChanged.name(), "ArticlesChanged");
        assert_eq!(ChangeSignal::AccountsChanged.to_string(), "AccountsChanged");
    }
}
