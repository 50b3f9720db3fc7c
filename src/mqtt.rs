//! MQTT remote for the active theme
//!
//! Connects to an MQTT broker and subscribes to a topic. Theme names
//! received there are forwarded to the main loop, which hands them to the
//! theme provider as if the user had picked them.

use crate::error::{Result, SakuraError};
use crate::theme::Theme;
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};
use serde::Deserialize;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 1883;
pub const DEFAULT_TOPIC: &str = "sakura/theme";
const CLIENT_ID: &str = "sakura";

/// JSON form of a theme message (plain text is also accepted)
#[derive(Deserialize)]
struct JsonMessage {
    theme: String,
}

/// Decode a payload: `{"theme": "dark"}` or just `dark`
pub fn parse_theme_payload(payload: &[u8]) -> Option<Theme> {
    let text = std::str::from_utf8(payload).ok()?.trim();
    if text.is_empty() {
        return None;
    }
    let name = match serde_json::from_str::<JsonMessage>(text) {
        Ok(json) => json.theme,
        Err(_) => text.to_string(),
    };
    match name.parse() {
        Ok(theme) => Some(theme),
        Err(e) => {
            log::warn!("MQTT: ignoring message: {}", e);
            None
        },
    }
}

/// MQTT subscription that receives themes in a background thread
pub struct ThemeRemote {
    receiver: Receiver<Theme>,
    _thread: thread::JoinHandle<()>,
}

impl ThemeRemote {
    /// Connect to the broker and subscribe to `topic` (default topic if empty).
    /// Fails immediately if the broker cannot be reached.
    pub fn connect(host: &str, port: u16, topic: &str) -> Result<Self> {
        let topic = if topic.is_empty() { DEFAULT_TOPIC } else { topic };

        let mut options = MqttOptions::new(CLIENT_ID, host, port);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut connection) = Client::new(options, 10);

        client.subscribe(topic, QoS::AtMostOnce).map_err(|e| {
            SakuraError::Mqtt(format!("failed to subscribe to '{}': {}", topic, e))
        })?;

        // Poll once so an unreachable broker fails here, not silently later
        match connection.iter().next() {
            Some(Ok(_)) => {},
            Some(Err(e)) => {
                return Err(SakuraError::Mqtt(format!(
                    "failed to connect to {}:{}: {}",
                    host, port, e
                )));
            },
            None => {
                return Err(SakuraError::Mqtt(format!(
                    "failed to connect to {}:{}: connection closed",
                    host, port
                )));
            },
        }

        let (sender, receiver) = mpsc::channel();
        let topic_owned = topic.to_string();
        let handle = thread::spawn(move || {
            Self::message_loop(connection, sender, &topic_owned);
        });

        log::info!("MQTT: connected to {}:{}, subscribed to '{}'", host, port, topic);

        Ok(Self {
            receiver,
            _thread: handle,
        })
    }

    fn message_loop(mut connection: Connection, sender: Sender<Theme>, topic: &str) {
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(Packet::Publish(publish))) if publish.topic == topic => {
                    if let Some(theme) = parse_theme_payload(&publish.payload) {
                        log::debug!("MQTT: theme '{}' requested", theme);
                        if sender.send(theme).is_err() {
                            // Main loop gone
                            break;
                        }
                    }
                },
                Ok(_) => {},
                Err(e) => {
                    // Keep going; rumqttc reconnects on the next poll
                    log::warn!("MQTT error: {}", e);
                    thread::sleep(Duration::from_secs(1));
                },
            }
        }
    }

    /// Latest requested theme, if any arrived (non-blocking).
    /// Older pending requests are discarded.
    pub fn poll(&self) -> Option<Theme> {
        let mut latest = None;
        while let Ok(theme) = self.receiver.try_recv() {
            latest = Some(theme);
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_payload() {
        assert_eq!(parse_theme_payload(b"dark"), Some(Theme::Dark));
        assert_eq!(parse_theme_payload(b"  Orange\n"), Some(Theme::Orange));
    }

    #[test]
    fn test_json_payload() {
        assert_eq!(
            parse_theme_payload(br#"{"theme": "blue"}"#),
            Some(Theme::Blue)
        );
    }

    #[test]
    fn test_rejected_payloads() {
        assert_eq!(parse_theme_payload(b""), None);
        assert_eq!(parse_theme_payload(b"   "), None);
        assert_eq!(parse_theme_payload(b"sepia"), None);
        assert_eq!(parse_theme_payload(br#"{"theme": "sepia"}"#), None);
        assert_eq!(parse_theme_payload(&[0xff, 0xfe]), None);
    }
}
