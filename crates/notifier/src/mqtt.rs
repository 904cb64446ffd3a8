//! MQTT emergency notifier

use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, QoS};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{EmergencyMessage, EmergencyNotifier, NotifyError};

/// MQTT broker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub broker_url: String,
    pub broker_port: u16,
    pub vehicle_id: String,
    pub keep_alive_secs: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_url: "localhost".to_string(),
            broker_port: 1883,
            vehicle_id: "unknown".to_string(),
            keep_alive_secs: 30,
        }
    }
}

impl MqttConfig {
    pub fn topic(&self) -> String {
        format!("vehicles/{}/emergency", self.vehicle_id)
    }
}

/// Publishes emergency messages without waiting on the broker
pub struct MqttNotifier {
    client: AsyncClient,
    topic: String,
}

impl MqttNotifier {
    /// Create the client and spawn its event loop; requires a tokio runtime
    pub fn connect(config: &MqttConfig) -> Self {
        let mut options = MqttOptions::new(
            format!("vehicle-{}", config.vehicle_id),
            &config.broker_url,
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        let (client, mut eventloop) = AsyncClient::new(options, 10);

        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(incoming)) => {
                        debug!("MQTT incoming: {:?}", incoming);
                    }
                    Err(e) => {
                        error!("MQTT error: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                    _ => {}
                }
            }
        });

        info!("MQTT notifier using broker {}:{}", config.broker_url, config.broker_port);
        Self {
            client,
            topic: config.topic(),
        }
    }
}

impl EmergencyNotifier for MqttNotifier {
    fn send(&self, message: &EmergencyMessage) -> Result<(), NotifyError> {
        let payload =
            serde_json::to_vec(message).map_err(|e| NotifyError::Serialization(e.to_string()))?;

        self.client
            .try_publish(&self.topic, QoS::AtLeastOnce, false, payload)
            .map_err(|e| NotifyError::Publish(e.to_string()))?;

        info!("Emergency notification queued: {}", message.incident);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_per_vehicle() {
        let config = MqttConfig {
            vehicle_id: "bus-12".to_string(),
            ..Default::default()
        };
        assert_eq!(config.topic(), "vehicles/bus-12/emergency");
    }

    #[tokio::test]
    async fn test_send_queues_without_broker() {
        let notifier = MqttNotifier::connect(&MqttConfig::default());
        let request = alerting::NotificationRequest::drowsiness(sensors::GpsFix::default());
        let message = EmergencyMessage::new(&request, "unknown", chrono::Utc::now());
        assert!(notifier.send(&message).is_ok());
    }
}
