//! Generation-tagged fan-in.
//!
//! A [`Ticket`] names the submission a piece of work belongs to. Results come
//! back wrapped in [`Tagged`] so the orchestrator can compare the ticket with
//! the live generation at the moment it commits them.

#![allow(dead_code)]

use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Ticket {
    pub fn new(generation: u64) -> Self {
        Self(generation)
    }

    pub fn generation(&self) -> u64 {
        self.0
    }

    pub fn is_current(&self, live_generation: u64) -> bool {
        self.0 == live_generation
    }
}

#[derive(Debug)]
pub struct Tagged<T> {
    pub ticket: Ticket,
    pub value: T,
}

/// Drives both futures concurrently and resolves only once *both* have
/// settled, successful or not. Neither outcome short-circuits the other.
pub async fn join_pair<A, B>(ticket: Ticket, left: A, right: B) -> Tagged<(A::Output, B::Output)>
where
    A: Future,
    B: Future,
{
    let value = tokio::join!(left, right);
    Tagged { ticket, value }
}
