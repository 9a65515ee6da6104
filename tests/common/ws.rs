// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::HttpServer;
use awc::ws::{Frame as ClientFrame, Message as ClientMessage};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::net::TcpListener;
use std::time::Duration;

pub async fn start_test_server(bundle: super::AppBundle) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");

    actix_web::rt::spawn(async move {
        let _ = HttpServer::new(move || super::build_test_app(bundle.clone()))
            .workers(1)
            .listen(listener)
            .expect("listen")
            .run()
            .await;
    });

    format!("http://{}", addr)
}

/// Next text frame, answering pings on the way. Panics after five seconds.
pub async fn read_text_frame<S, E>(framed: &mut S) -> String
where
    S: Stream<Item = Result<ClientFrame, E>> + Sink<ClientMessage, Error = E> + Unpin,
    E: std::fmt::Debug,
{
    let read = async {
        loop {
            let frame = framed.next().await.expect("ws frame").expect("ws ok");
            match frame {
                ClientFrame::Text(bytes) => {
                    return String::from_utf8(bytes.to_vec()).expect("utf8 frame");
                }
                ClientFrame::Ping(bytes) => {
                    framed.send(ClientMessage::Pong(bytes)).await.expect("pong");
                }
                ClientFrame::Close(_) => panic!("WebSocket closed"),
                _ => {}
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), read)
        .await
        .expect("text frame within timeout")
}
