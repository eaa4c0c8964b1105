//! Notification Channels
//!
//! A closed set of delivery channels (email, SMS, local buzzer/LED) plus
//! the dispatcher that fans an approved notification out to every
//! eligible channel with bounded retry. Channel failure is reported,
//! never raised to the caller.

mod channel;
mod dispatcher;

pub use channel::{
    Channel, ChannelError, ChannelKind, EmailChannel, EmailConfig, LocalChannel, LocalConfig,
    MockBehavior, MockChannel, SmsChannel, SmsConfig,
};
pub use dispatcher::{
    ChannelDispatcher, ChannelOutcome, Delivery, DispatchConfig, DispatchReport,
};
