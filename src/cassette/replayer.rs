//! Serves recorded interactions back in order.

use std::collections::HashMap;

use super::format::{Cassette, Interaction};

/// Key for indexing interactions by port and method.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct PortMethodKey {
    port: String,
    method: String,
}

/// Replays a cassette with an independent cursor per port/method pair.
///
/// Each call's input is compared to the recorded one, so a replay fails loudly
/// when the code under test asks for something different from what was
/// recorded (for example a different candidate sequence).
pub struct CassetteReplayer {
    queues: HashMap<PortMethodKey, Vec<Interaction>>,
    cursors: HashMap<PortMethodKey, usize>,
}

impl CassetteReplayer {
    /// Indexes `cassette` for replay.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<PortMethodKey, Vec<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = PortMethodKey {
                port: interaction.port.clone(),
                method: interaction.method.clone(),
            };
            queues.entry(key).or_default().push(interaction.clone());
        }
        let cursors = queues.keys().map(|k| (k.clone(), 0)).collect();
        Self { queues, cursors }
    }

    /// Returns the recorded output of the next `port`/`method` interaction.
    ///
    /// # Panics
    ///
    /// Panics if the cassette has no further interaction for the pair, or if
    /// `input` differs from the recorded input.
    pub fn next_output(
        &mut self,
        port: &str,
        method: &str,
        input: &serde_json::Value,
    ) -> serde_json::Value {
        let key = PortMethodKey { port: port.to_string(), method: method.to_string() };

        let queue = self.queues.get(&key).unwrap_or_else(|| {
            let available: Vec<String> =
                self.queues.keys().map(|k| format!("{}::{}", k.port, k.method)).collect();
            panic!(
                "Cassette exhausted: no interactions recorded for port={port:?} method={method:?}. \
                 Available port::method pairs: [{}]",
                available.join(", ")
            );
        });

        let cursor = self.cursors.get_mut(&key).expect("cursor exists for every queue");
        assert!(
            *cursor < queue.len(),
            "Cassette exhausted: all {count} interactions for port={port:?} method={method:?} \
             have been consumed. Last interaction was seq={last_seq}.",
            count = queue.len(),
            last_seq = queue.last().map_or(0, |i| i.seq),
        );

        let interaction = &queue[*cursor];
        assert_eq!(
            &interaction.input, input,
            "Cassette mismatch at seq={} for {port}::{method}: recorded input differs from call",
            interaction.seq
        );
        *cursor += 1;
        interaction.output.clone()
    }

    /// Number of interactions not yet replayed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queues.iter().map(|(key, queue)| queue.len() - self.cursors[key]).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn interaction(
        seq: u64,
        port: &str,
        method: &str,
        input: serde_json::Value,
        output: serde_json::Value,
    ) -> Interaction {
        Interaction { seq, port: port.into(), method: method.into(), input, output }
    }

    fn make_cassette(interactions: Vec<Interaction>) -> Cassette {
        Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            source: "local".into(),
            policy: None,
            interactions,
        }
    }

    #[test]
    fn replays_each_port_in_order() {
        let cassette = make_cassette(vec![
            interaction(0, "directory", "query", json!({"filter": "a"}), json!({"Ok": [1]})),
            interaction(1, "counter", "get_attribute_value", json!({}), json!({"Ok": "7"})),
            interaction(2, "directory", "query", json!({"filter": "b"}), json!({"Ok": []})),
        ]);

        let mut replayer = CassetteReplayer::new(&cassette);
        assert_eq!(replayer.remaining(), 3);
        let a = replayer.next_output("directory", "query", &json!({"filter": "a"}));
        let counter = replayer.next_output("counter", "get_attribute_value", &json!({}));
        let b = replayer.next_output("directory", "query", &json!({"filter": "b"}));
        assert_eq!(a, json!({"Ok": [1]}));
        assert_eq!(counter, json!({"Ok": "7"}));
        assert_eq!(b, json!({"Ok": []}));
        assert_eq!(replayer.remaining(), 0);
    }

    #[test]
    #[should_panic(expected = "Cassette exhausted")]
    fn exhausted_replayer_panics() {
        let cassette =
            make_cassette(vec![interaction(0, "directory", "query", json!({}), json!({"Ok": []}))]);
        let mut replayer = CassetteReplayer::new(&cassette);
        let _ = replayer.next_output("directory", "query", &json!({}));
        let _ = replayer.next_output("directory", "query", &json!({}));
    }

    #[test]
    #[should_panic(expected = "no interactions recorded")]
    fn unknown_port_panics() {
        let mut replayer = CassetteReplayer::new(&make_cassette(vec![]));
        let _ = replayer.next_output("counter", "get_attribute_value", &json!({}));
    }

    #[test]
    #[should_panic(expected = "Cassette mismatch")]
    fn differing_input_panics() {
        let cassette = make_cassette(vec![interaction(
            0,
            "directory",
            "query",
            json!({"filter": "a"}),
            json!({"Ok": []}),
        )]);
        let mut replayer = CassetteReplayer::new(&cassette);
        let _ = replayer.next_output("directory", "query", &json!({"filter": "z"}));
    }
}
