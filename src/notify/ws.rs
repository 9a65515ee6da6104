// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{ChangeSignal, SignalSink, relay};
use crate::app_state::AppState;
use actix_web::{HttpRequest, HttpResponse, Result, web};
use actix_ws::{AggregatedMessage, Session};
use async_trait::async_trait;
use futures_util::StreamExt;

const WS_MAX_MESSAGE_BYTES: usize = 4 * 1024;

/// Writes each signal name as a text frame.
struct SessionSink {
    session: Session,
}

#[async_trait(?Send)]
impl SignalSink for SessionSink {
    async fn deliver(&mut self, signal: ChangeSignal) -> Result<(), String> {
        self.session
            .text(signal.name())
            .await
            .map_err(|err| format!("WS closed: {}", err))
    }
}

/// Push channel for change signals. Open to anyone; frames carry no data beyond
/// the signal name, so clients refetch through the regular, gated endpoints.
pub async fn notifications_ws(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (response, session, message_stream) = actix_ws::handle(&req, stream)?;
    let mut messages = message_stream
        .max_frame_size(WS_MAX_MESSAGE_BYTES)
        .aggregate_continuations()
        .max_continuation_size(WS_MAX_MESSAGE_BYTES);

    let subscription = app_state.notifier.subscribe();
    let mut sink = SessionSink {
        session: session.clone(),
    };
    let forwarder = actix_web::rt::spawn(async move {
        relay(subscription, &mut sink).await;
    });
    log::debug!("Notification WS connected");

    actix_web::rt::spawn(async move {
        let mut session = session;
        while let Some(message) = messages.next().await {
            match message {
                Ok(AggregatedMessage::Ping(bytes)) => {
                    if session.pong(&bytes).await.is_err() {
                        break;
                    }
                }
                Ok(AggregatedMessage::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    log::debug!("Notification WS error: {}", err);
                    break;
                }
            }
        }
        forwarder.abort();
        let _ = session.close(None).await;
        log::debug!("Notification WS closed");
    });

    Ok(response)
}
