use std::sync::Arc;
use std::thread;
use std::time::SystemTime;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, warn};

use crate::assistant::Assistant;
use crate::error::AppResult;
use crate::timestamp;
use crate::types::{ChatMessage, Role, SimulationResult};

pub const CHAT_FALLBACK: &str = "There was an error connecting to the assistant.";
pub const ANALYSIS_FALLBACK: &str = "The lattice analysis could not be completed.";
pub const ANALYSIS_HEADING: &str = "### SIMULATION ANALYSIS";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RequestKind {
    Chat,
    Analysis,
}

struct Reply {
    kind: RequestKind,
    result: AppResult<String>,
}

/// Runs assistant calls on short-lived background threads and hands the replies back
/// over a channel the UI drains once per frame.
struct Dispatcher {
    assistant: Arc<dyn Assistant>,
    tx: Sender<Reply>,
    rx: Receiver<Reply>,
}

impl Dispatcher {
    fn new(assistant: Arc<dyn Assistant>) -> Self {
        let (tx, rx) = unbounded();
        Self { assistant, tx, rx }
    }

    fn dispatch<F>(&self, kind: RequestKind, call: F) -> AppResult<()>
    where
        F: FnOnce(&dyn Assistant) -> AppResult<String> + Send + 'static,
    {
        let assistant = Arc::clone(&self.assistant);
        let tx = self.tx.clone();
        thread::Builder::new()
            .name(format!("assistant-{kind:?}").to_lowercase())
            .spawn(move || {
                let result = call(assistant.as_ref());
                if tx.send(Reply { kind, result }).is_err() {
                    debug!("assistant reply dropped; conversation gone");
                }
            })?;
        Ok(())
    }
}

/// Message log plus the pending flags of the assistant panel.
pub struct Conversation {
    messages: Vec<ChatMessage>,
    pub input: String,
    typing: bool,
    analyzing: bool,
    dispatcher: Dispatcher,
}

impl Conversation {
    pub fn new(assistant: Arc<dyn Assistant>) -> Self {
        Self {
            messages: Vec::new(),
            input: String::new(),
            typing: false,
            analyzing: false,
            dispatcher: Dispatcher::new(assistant),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    pub fn is_busy(&self) -> bool {
        self.typing || self.analyzing
    }

    pub fn can_send(&self) -> bool {
        !self.typing && !self.input.trim().is_empty()
    }

    pub fn can_analyze(&self, has_session: bool) -> bool {
        has_session && !self.analyzing
    }

    /// Sends the current input as a chat message. Ignored while a chat reply is pending.
    pub fn send(&mut self, at: SystemTime) -> bool {
        if !self.can_send() {
            return false;
        }

        let message = std::mem::take(&mut self.input);
        self.push(Role::User, message.clone(), at);
        self.typing = true;

        let dispatched = self
            .dispatcher
            .dispatch(RequestKind::Chat, move |assistant| assistant.chat(&message));
        if let Err(err) = dispatched {
            self.settle(RequestKind::Chat, Err(err), at);
        }
        true
    }

    pub fn request_analysis(&mut self, session: Option<SimulationResult>, at: SystemTime) -> bool {
        let Some(session) = session else {
            return false;
        };
        if !self.can_analyze(true) {
            return false;
        }

        self.analyzing = true;
        let dispatched = self
            .dispatcher
            .dispatch(RequestKind::Analysis, move |assistant| {
                assistant.analyze(&session)
            });
        if let Err(err) = dispatched {
            self.settle(RequestKind::Analysis, Err(err), at);
        }
        true
    }

    /// Appends every reply that has arrived since the last call. Returns how many.
    pub fn poll(&mut self, at: SystemTime) -> usize {
        let mut settled = 0;
        while let Ok(reply) = self.dispatcher.rx.try_recv() {
            self.settle(reply.kind, reply.result, at);
            settled += 1;
        }
        settled
    }

    fn settle(&mut self, kind: RequestKind, result: AppResult<String>, at: SystemTime) {
        let content = match (kind, result) {
            (RequestKind::Chat, Ok(text)) => text,
            (RequestKind::Analysis, Ok(text)) => format!("{ANALYSIS_HEADING}\n{text}"),
            (kind, Err(err)) => {
                warn!(?kind, %err, "assistant request failed");
                match kind {
                    RequestKind::Chat => CHAT_FALLBACK.to_owned(),
                    RequestKind::Analysis => ANALYSIS_FALLBACK.to_owned(),
                }
            }
        };
        match kind {
            RequestKind::Chat => self.typing = false,
            RequestKind::Analysis => self.analyzing = false,
        }
        self.push(Role::Model, content, at);
    }

    fn push(&mut self, role: Role, content: String, at: SystemTime) {
        self.messages.push(ChatMessage {
            role,
            content,
            timestamp: timestamp::time_of_day(at),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::lattice::generate_nodes;
    use crate::metrics::calculate_metrics;
    use crate::types::{AbcParams, SimulationConfig};
    use crossbeam_channel::bounded;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers only once released, so tests can observe the pending state.
    struct Scripted {
        gate: Mutex<Receiver<()>>,
        fail: bool,
    }

    impl Assistant for Scripted {
        fn chat(&self, message: &str) -> AppResult<String> {
            let _ = self.gate.lock().unwrap().recv();
            if self.fail {
                Err(AppError::MissingApiKey("TEST_KEY".to_owned()))
            } else {
                Ok(format!("echo: {message}"))
            }
        }

        fn analyze(&self, session: &SimulationResult) -> AppResult<String> {
            let _ = self.gate.lock().unwrap().recv();
            if self.fail {
                Err(AppError::MissingApiKey("TEST_KEY".to_owned()))
            } else {
                Ok(format!("{} nodes", session.nodes.len()))
            }
        }
    }

    fn conversation(fail: bool) -> (Conversation, Sender<()>) {
        let (release, gate) = bounded(8);
        let assistant = Scripted {
            gate: Mutex::new(gate),
            fail,
        };
        (Conversation::new(Arc::new(assistant)), release)
    }

    fn wait_for_reply(conv: &mut Conversation) {
        let reply = conv
            .dispatcher
            .rx
            .recv_timeout(Duration::from_secs(5))
            .expect("assistant reply");
        conv.settle(reply.kind, reply.result, SystemTime::now());
    }

    fn session() -> SimulationResult {
        let params = AbcParams::default();
        let mut rng = StdRng::seed_from_u64(30);
        let nodes = generate_nodes(25, &params, &mut rng);
        SimulationResult {
            metrics: calculate_metrics(&params, &nodes).unwrap(),
            nodes,
            timestamp: "t".to_owned(),
            config: SimulationConfig {
                node_count: 25,
                params,
            },
        }
    }

    #[test]
    fn chat_round_trip_appends_reply() {
        let (mut conv, release) = conversation(false);
        conv.input = "hello lattice".to_owned();
        assert!(conv.send(SystemTime::now()));
        assert!(conv.is_typing());
        assert!(conv.input.is_empty());

        release.send(()).unwrap();
        wait_for_reply(&mut conv);

        assert!(!conv.is_typing());
        let contents: Vec<&str> = conv.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hello lattice", "echo: hello lattice"]);
        assert_eq!(conv.messages()[1].role, Role::Model);
    }

    #[test]
    fn send_is_blocked_while_reply_pending() {
        let (mut conv, release) = conversation(false);
        conv.input = "first".to_owned();
        assert!(conv.send(SystemTime::now()));
        conv.input = "second".to_owned();
        assert!(!conv.can_send());
        assert!(!conv.send(SystemTime::now()));
        assert_eq!(conv.messages().len(), 1);

        release.send(()).unwrap();
        wait_for_reply(&mut conv);
        assert!(conv.can_send());
    }

    #[test]
    fn blank_input_is_not_sent() {
        let (mut conv, _release) = conversation(false);
        conv.input = "   ".to_owned();
        assert!(!conv.send(SystemTime::now()));
        assert!(conv.messages().is_empty());
    }

    #[test]
    fn failure_becomes_single_fallback() {
        let (mut conv, release) = conversation(true);
        conv.input = "will fail".to_owned();
        conv.send(SystemTime::now());
        release.send(()).unwrap();
        wait_for_reply(&mut conv);

        assert_eq!(conv.messages().len(), 2);
        assert_eq!(conv.messages()[1].content, CHAT_FALLBACK);
        assert_eq!(conv.poll(SystemTime::now()), 0);
    }

    #[test]
    fn analysis_needs_session_and_is_prefixed() {
        let (mut conv, release) = conversation(false);
        assert!(!conv.request_analysis(None, SystemTime::now()));

        assert!(conv.request_analysis(Some(session()), SystemTime::now()));
        assert!(conv.is_analyzing());
        assert!(!conv.request_analysis(Some(session()), SystemTime::now()));

        release.send(()).unwrap();
        wait_for_reply(&mut conv);
        assert!(!conv.is_analyzing());
        assert_eq!(
            conv.messages()[0].content,
            format!("{ANALYSIS_HEADING}\n25 nodes")
        );
    }

    #[test]
    fn failed_analysis_uses_fallback() {
        let (mut conv, release) = conversation(true);
        conv.request_analysis(Some(session()), SystemTime::now());
        release.send(()).unwrap();
        wait_for_reply(&mut conv);
        assert_eq!(conv.messages()[0].content, ANALYSIS_FALLBACK);
    }
}
