//! Call session orchestration.
//!
//! A [`CallController`] runs one call through its whole life: it issues the
//! caller's and the agent's access grants, joins the RTC channel, publishes
//! the microphone, launches the remote agent and, on hangup or failure,
//! releases all of it again. The media SDK, token issuer and agent API sit
//! behind the [`RtcClient`], [`GrantIssuer`] and [`AgentControl`] seams.

pub mod controller;
pub mod error;
pub mod identity;
pub mod rtc;
pub mod seams;

pub use controller::{CallController, CallRequest, SessionSnapshot};
pub use error::CallError;
pub use identity::{channel_name, participant_pair, ParticipantPair};
pub use rtc::{MediaError, RtcClient, RtcEvent};
pub use seams::{AgentControl, GrantIssuer};
