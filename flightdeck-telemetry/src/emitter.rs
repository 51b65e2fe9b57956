//! Fan-out of decoded messages to subscribers.
//!
//! For every message, each subscriber first gets one
//! [`variable_updated`][Subscriber::variable_updated] call per measurement (in
//! message order, including measurements that failed to decode), and then one
//! [`message_received`][Subscriber::message_received] call for the whole
//! message.

use std::{
    collections::HashMap,
    sync::Arc,
};

use flightdeck_types::{
    Measurement,
    Message,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;

pub trait Subscriber {
    fn variable_updated(&mut self, measurement: &Measurement) {
        let _ = measurement;
    }

    fn message_received(&mut self, message: &Message) {
        let _ = message;
    }
}

impl<S: Subscriber + ?Sized> Subscriber for Box<S> {
    fn variable_updated(&mut self, measurement: &Measurement) {
        (**self).variable_updated(measurement);
    }

    fn message_received(&mut self, message: &Message) {
        (**self).message_received(message);
    }
}

impl<S: Subscriber + ?Sized> Subscriber for Arc<Mutex<S>> {
    fn variable_updated(&mut self, measurement: &Measurement) {
        self.lock().variable_updated(measurement);
    }

    fn message_received(&mut self, message: &Message) {
        self.lock().message_received(message);
    }
}

/// Owned copy of what a [`Subscriber`] gets, for sending over channels.
#[derive(Clone, Debug)]
pub enum Event {
    VariableUpdated(Measurement),
    MessageReceived(Message),
}

/// Forwards events into a channel.
///
/// Events are dropped once the receiver is gone.
impl Subscriber for mpsc::UnboundedSender<Event> {
    fn variable_updated(&mut self, measurement: &Measurement) {
        let _ = self.send(Event::VariableUpdated(measurement.clone()));
    }

    fn message_received(&mut self, message: &Message) {
        let _ = self.send(Event::MessageReceived(message.clone()));
    }
}

/// Calls a closure for every measurement.
#[derive(Clone, Copy, Debug)]
pub struct OnVariable<F>(pub F);

impl<F: FnMut(&Measurement)> Subscriber for OnVariable<F> {
    fn variable_updated(&mut self, measurement: &Measurement) {
        (self.0)(measurement);
    }
}

/// Calls a closure for every message.
#[derive(Clone, Copy, Debug)]
pub struct OnMessage<F>(pub F);

impl<F: FnMut(&Message)> Subscriber for OnMessage<F> {
    fn message_received(&mut self, message: &Message) {
        (self.0)(message);
    }
}

type Handler = Box<dyn FnMut(&Measurement) + Send>;

/// Routes measurements to handlers registered for their label.
///
/// This is what drives individual indicators: each indicator links itself to
/// the label it displays.
#[derive(Default)]
pub struct LabelRouter {
    handlers: HashMap<String, Vec<Handler>>,
}

impl LabelRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(
        &mut self,
        label: impl Into<String>,
        handler: impl FnMut(&Measurement) + Send + 'static,
    ) {
        self.handlers
            .entry(label.into())
            .or_default()
            .push(Box::new(handler));
    }

    pub fn unlink(&mut self, label: &str) {
        self.handlers.remove(label);
    }

    pub fn is_linked(&self, label: &str) -> bool {
        self.handlers.contains_key(label)
    }
}

impl std::fmt::Debug for LabelRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelRouter")
            .field("labels", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Subscriber for LabelRouter {
    fn variable_updated(&mut self, measurement: &Measurement) {
        if let Some(handlers) = self.handlers.get_mut(&*measurement.label) {
            for handler in handlers {
                handler(measurement);
            }
        }
    }
}

/// List of subscribers.
#[derive(Default)]
pub struct Emitter {
    subscribers: Vec<Box<dyn Subscriber + Send>>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl Subscriber + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Creates a channel that receives all events.
    pub fn channel(&mut self) -> mpsc::UnboundedReceiver<Event> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribe(sender);
        receiver
    }

    pub fn num_subscribers(&self) -> usize {
        self.subscribers.len()
    }

    pub fn emit(&mut self, message: &Message) {
        for subscriber in &mut self.subscribers {
            for measurement in message {
                subscriber.variable_updated(measurement);
            }
            subscriber.message_received(message);
        }
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("num_subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use flightdeck_types::{
        Measurement,
        Message,
    };
    use parking_lot::Mutex;

    use crate::emitter::{
        Emitter,
        Event,
        LabelRouter,
        OnMessage,
        OnVariable,
        Subscriber,
    };

    fn example() -> Message {
        Message::new(vec![
            Measurement::new("RPM", "rpm", 2400.0),
            Measurement::new("oil pressure", "PSI", f64::NAN),
        ])
    }

    #[derive(Debug, Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl Subscriber for Recorder {
        fn variable_updated(&mut self, measurement: &Measurement) {
            self.events.push(format!("variable {}", measurement.label));
        }

        fn message_received(&mut self, message: &Message) {
            self.events.push(format!("message {}", message.len()));
        }
    }

    #[test]
    fn it_emits_variables_before_the_message() {
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        let mut emitter = Emitter::new();
        emitter.subscribe(recorder.clone());

        emitter.emit(&example());

        assert_eq!(
            recorder.lock().events,
            ["variable RPM", "variable oil pressure", "message 2"]
        );
    }

    #[test]
    fn every_subscriber_gets_every_event() {
        let variables = Arc::new(Mutex::new(Vec::new()));
        let messages = Arc::new(Mutex::new(0));

        let mut emitter = Emitter::new();
        for _ in 0..2 {
            let variables = variables.clone();
            emitter.subscribe(OnVariable(move |measurement: &Measurement| {
                variables.lock().push(measurement.value);
            }));
            let messages = messages.clone();
            emitter.subscribe(OnMessage(move |_: &Message| *messages.lock() += 1));
        }
        assert_eq!(emitter.num_subscribers(), 4);

        emitter.emit(&example());
        emitter.emit(&example());

        // NaN values are emitted too
        let variables = variables.lock();
        assert_eq!(variables.len(), 8);
        assert!(variables[1].is_nan());
        assert_eq!(*messages.lock(), 4);
    }

    #[test]
    fn it_routes_by_label() {
        let rpm = Arc::new(Mutex::new(Vec::new()));

        let mut router = LabelRouter::new();
        router.link("RPM", {
            let rpm = rpm.clone();
            move |measurement: &Measurement| rpm.lock().push(measurement.value)
        });
        assert!(router.is_linked("RPM"));
        assert!(!router.is_linked("oil pressure"));

        let mut emitter = Emitter::new();
        let router = Arc::new(Mutex::new(router));
        emitter.subscribe(router.clone());

        emitter.emit(&example());
        assert_eq!(*rpm.lock(), [2400.0]);

        router.lock().unlink("RPM");
        emitter.emit(&example());
        assert_eq!(rpm.lock().len(), 1);
    }

    #[tokio::test]
    async fn it_sends_events_to_channels() {
        let mut emitter = Emitter::new();
        let mut receiver = emitter.channel();

        emitter.emit(&example());
        drop(emitter);

        let mut events = Vec::new();
        while let Some(event) = receiver.recv().await {
            events.push(event);
        }

        assert_eq!(events.len(), 3);
        assert!(
            matches!(&events[0], Event::VariableUpdated(measurement) if measurement.label == "RPM")
        );
        assert!(matches!(&events[2], Event::MessageReceived(message) if message.len() == 2));
    }
}
