// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structured log events emitted by the registry.
//!
//! Events are only emitted when the `logs` feature is enabled. Field names are dot-separated
//! and shared by every event that carries them.

#![cfg_attr(
    not(any(feature = "logs", test)),
    expect(unused_variables, dead_code, reason = "only consumed by log events")
)]

use crate::{Error, TimerId, TimerMode};

pub(crate) const TIMER_INSERTED_EVENT_NAME: &str = "soft_timer.timer.inserted";
pub(crate) const TIMER_DETACHED_EVENT_NAME: &str = "soft_timer.timer.detached";
pub(crate) const TIMER_STARTED_EVENT_NAME: &str = "soft_timer.timer.started";
pub(crate) const TIMER_EXPIRED_EVENT_NAME: &str = "soft_timer.timer.expired";
pub(crate) const TIMER_REJECTED_EVENT_NAME: &str = "soft_timer.timer.rejected";

pub(crate) fn timer_inserted(id: TimerId, ownership: &'static str, len: usize) {
    #[cfg(any(feature = "logs", test))]
    tracing::event!(
        name: TIMER_INSERTED_EVENT_NAME,
        tracing::Level::DEBUG,
        timer.id = %id,
        timer.ownership = ownership,
        registry.len = len,
    );
}

pub(crate) fn timer_detached(id: TimerId, len: usize) {
    #[cfg(any(feature = "logs", test))]
    tracing::event!(
        name: TIMER_DETACHED_EVENT_NAME,
        tracing::Level::DEBUG,
        timer.id = %id,
        registry.len = len,
    );
}

pub(crate) fn timer_started(id: TimerId, mode: TimerMode, interval: u32, deadline: u32) {
    #[cfg(any(feature = "logs", test))]
    tracing::event!(
        name: TIMER_STARTED_EVENT_NAME,
        tracing::Level::TRACE,
        timer.id = %id,
        timer.mode = mode.as_str(),
        timer.interval = interval,
        timer.deadline = deadline,
    );
}

pub(crate) fn timer_expired(id: TimerId, mode: TimerMode, now: u32) {
    #[cfg(any(feature = "logs", test))]
    tracing::event!(
        name: TIMER_EXPIRED_EVENT_NAME,
        tracing::Level::TRACE,
        timer.id = %id,
        timer.mode = mode.as_str(),
        tick.now = now,
    );
}

/// Reports misuse of the registry. The error is still returned to the caller.
pub(crate) fn timer_rejected(operation: &'static str, error: &Error) {
    #[cfg(any(feature = "logs", test))]
    tracing::event!(
        name: TIMER_REJECTED_EVENT_NAME,
        tracing::Level::WARN,
        timer.operation = operation,
        error.message = %error,
    );
}
