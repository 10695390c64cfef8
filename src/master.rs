use super::graph::{chunk_size, partition};
use super::state::State;
use super::worker::{ProgramSlot, Worker};
use super::Accumulator;
use super::Context;
use super::EngineOptions;
use super::Graph;
use super::VertexId;
use super::VertexMut;
use super::VertexProgram;
use crate::error::{PregelError, Result};

use std::panic;
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};
use tracing::info;

/// Outcome of [`Master::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub rounds: usize,
    pub signals: usize,
    pub elapsed: Duration,
}

/// Synchronous engine driving a [`VertexProgram`] over a graph.
///
/// Vertices are split into contiguous ranges, one per worker. Each phase of
/// a round runs all workers on scoped threads and joins them, so the join is
/// the barrier between phases. A round only visits vertices whose
/// accumulator slot holds a message, and the run ends once the round cap is
/// reached or a round starts with no such vertex anywhere.
pub struct Master<P>
where
    P: VertexProgram,
{
    options: EngineOptions,
    prototype: P,
    accumulator: Accumulator<P::Message>,
    workers: Vec<Worker>,
    slots: Vec<ProgramSlot<P>>,
    state: State,
    round: usize,
    n_signals: usize,
}

fn join_all<T>(handles: Vec<ScopedJoinHandle<'_, T>>) -> Vec<T> {
    handles
        .into_iter()
        .map(|handle| {
            handle
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload))
        })
        .collect()
}

impl<P> Master<P>
where
    P: VertexProgram,
{
    pub fn new(prototype: P, num_vertices: usize, options: EngineOptions) -> Self {
        let mut master = Master {
            options,
            prototype,
            accumulator: Accumulator::new(0),
            workers: Vec::new(),
            slots: Vec::new(),
            state: State::Gather,
            round: 0,
            n_signals: 0,
        };
        master.resize(num_vertices);
        master
    }

    pub fn for_graph(prototype: P, graph: &Graph<P::Data>, options: EngineOptions) -> Self {
        Master::new(prototype, graph.num_vertices(), options)
    }

    /// Re-sizes the engine for a reloaded graph. Drops pending messages and
    /// restarts the round counter.
    pub fn resize(&mut self, num_vertices: usize) {
        self.accumulator.resize(num_vertices);
        self.slots.clear();
        self.slots.resize_with(num_vertices, ProgramSlot::default);
        self.workers = partition(num_vertices, self.options.nworkers)
            .into_iter()
            .enumerate()
            .map(|(id, range)| Worker::new(id, range))
            .collect();
        self.state = State::Gather;
        self.round = 0;
        self.n_signals = 0;
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn accumulator(&self) -> &Accumulator<P::Message> {
        &self.accumulator
    }

    /// Schedules `vid` with `message` for the next round.
    pub fn signal(&self, vid: VertexId, message: P::Message) {
        self.accumulator.add(vid, message);
    }

    /// Schedules every vertex with an empty message.
    pub fn signal_all(&self) {
        for vid in 0..self.accumulator.size() {
            self.accumulator.add(vid as VertexId, P::Message::default());
        }
    }

    fn check(&self, graph: &Graph<P::Data>) -> Result<()> {
        if !graph.is_finalized() {
            return Err(PregelError::NotFinalized);
        }
        if graph.num_vertices() != self.accumulator.size() {
            return Err(PregelError::VertexCountMismatch {
                expected: self.accumulator.size(),
                actual: graph.num_vertices(),
            });
        }
        Ok(())
    }

    fn chunk(&self) -> usize {
        chunk_size(self.slots.len(), self.options.nworkers)
    }

    /// Runs `transform` on every vertex in parallel. Signals it sends are
    /// delivered in the next round. Returns the number of signals sent.
    pub fn transform_vertices<F>(
        &mut self,
        graph: &mut Graph<P::Data>,
        transform: F,
    ) -> Result<usize>
    where
        F: Fn(&Context<P::Message>, &mut VertexMut<P::Data>) + Sync,
    {
        self.check(graph)?;

        let chunk = self.chunk();
        let (round, max_rounds) = (self.round, self.options.max_rounds);
        let num_edges = graph.num_edges();
        let accumulator = &self.accumulator;
        let workers = &mut self.workers;
        let (topology, data) = graph.split_mut();
        let transform = &transform;

        thread::scope(|scope| {
            let handles: Vec<_> = workers
                .iter_mut()
                .zip(data.chunks_mut(chunk))
                .map(|(worker, data)| {
                    scope.spawn(move || {
                        let context = Context::new(round, max_rounds, num_edges, accumulator);
                        worker.transform(&context, topology, data, transform);
                    })
                })
                .collect();
            join_all(handles);
        });

        let sent = self.workers.iter().map(|worker| worker.n_signals_sent).sum();
        self.n_signals += sent;
        info!(signals = sent, "transformed vertices");
        Ok(sent)
    }

    fn gather(&mut self, graph: &Graph<P::Data>) -> usize {
        let chunk = self.chunk();
        let (round, max_rounds) = (self.round, self.options.max_rounds);
        let num_edges = graph.num_edges();
        let prototype = &self.prototype;
        let accumulator = &self.accumulator;
        let workers = &mut self.workers;
        let slots = &mut self.slots;
        let (topology, data) = (graph.topology(), graph.vertex_data());

        thread::scope(|scope| {
            let handles: Vec<_> = workers
                .iter_mut()
                .zip(slots.chunks_mut(chunk))
                .map(|(worker, slots)| {
                    scope.spawn(move || {
                        let context = Context::new(round, max_rounds, num_edges, accumulator);
                        worker.gather(&context, prototype, topology, data, slots);
                    })
                })
                .collect();
            join_all(handles);
        });

        self.workers
            .iter()
            .map(|worker| worker.n_active_vertices)
            .sum()
    }

    fn apply(&mut self, graph: &mut Graph<P::Data>) -> Result<()> {
        let chunk = self.chunk();
        let (round, max_rounds) = (self.round, self.options.max_rounds);
        let persist = self.options.persist_programs;
        let num_edges = graph.num_edges();
        let accumulator = &self.accumulator;
        let workers = &mut self.workers;
        let slots = &mut self.slots;
        let (topology, data) = graph.split_mut();

        thread::scope(|scope| {
            let handles: Vec<_> = workers
                .iter_mut()
                .zip(data.chunks_mut(chunk).zip(slots.chunks_mut(chunk)))
                .map(|(worker, (data, slots))| {
                    scope.spawn(move || {
                        let context = Context::new(round, max_rounds, num_edges, accumulator);
                        worker.apply(&context, topology, data, slots, persist)
                    })
                })
                .collect();
            join_all(handles).into_iter().collect()
        })
    }

    fn scatter(&mut self, graph: &Graph<P::Data>) -> Result<()> {
        let chunk = self.chunk();
        let (round, max_rounds) = (self.round, self.options.max_rounds);
        let num_edges = graph.num_edges();
        let prototype = &self.prototype;
        let accumulator = &self.accumulator;
        let workers = &mut self.workers;
        let slots = &mut self.slots;
        let (topology, data) = (graph.topology(), graph.vertex_data());

        thread::scope(|scope| {
            let handles: Vec<_> = workers
                .iter_mut()
                .zip(slots.chunks_mut(chunk))
                .map(|(worker, slots)| {
                    scope.spawn(move || {
                        let context = Context::new(round, max_rounds, num_edges, accumulator);
                        worker.scatter(&context, prototype, topology, data, slots)
                    })
                })
                .collect();
            join_all(handles).into_iter().collect()
        })
    }

    fn print_stats(&self) {
        let active: usize = self.workers.iter().map(|w| w.n_active_vertices).sum();
        let signals: usize = self.workers.iter().map(|w| w.n_signals_sent).sum();
        let activated: usize = self.workers.iter().map(|w| w.n_vertices_activated).sum();
        info!(
            round = self.round,
            active, signals, activated, "round complete"
        );

        for worker in &self.workers {
            tracing::debug!(
                worker = worker.id,
                n_vertices = worker.local_n_vertices(),
                n_active_vertices = worker.n_active_vertices,
                n_signals_sent = worker.n_signals_sent,
                time_cost_ms = worker.time_cost,
                "worker stats"
            );
        }
    }

    /// Runs a single round. Returns whether another round would run.
    pub fn step(&mut self, graph: &mut Graph<P::Data>) -> Result<bool> {
        self.check(graph)?;
        // A finished run resumes when new messages arrive below the cap.
        self.state = if self.round >= self.options.max_rounds {
            State::Done
        } else {
            State::Gather
        };

        loop {
            match self.state {
                State::Gather => {
                    if self.gather(graph) == 0 {
                        info!(round = self.round, "no active vertices left");
                        self.state = State::Done;
                    } else {
                        self.state = State::Apply;
                    }
                }
                State::Apply => {
                    self.apply(graph)?;
                    self.state = State::Scatter;
                }
                State::Scatter => {
                    self.scatter(graph)?;
                    self.print_stats();
                    self.n_signals += self
                        .workers
                        .iter()
                        .map(|worker| worker.n_signals_sent)
                        .sum::<usize>();
                    self.round += 1;
                    self.state = if self.round >= self.options.max_rounds {
                        State::Done
                    } else {
                        State::Gather
                    };
                    return Ok(self.state != State::Done);
                }
                State::Done => return Ok(false),
            }
        }
    }

    /// Runs rounds until the round cap or until no vertex has work.
    pub fn start(&mut self, graph: &mut Graph<P::Data>) -> Result<RunSummary> {
        let now = Instant::now();
        let first_round = self.round;
        let first_signals = self.n_signals;

        while self.step(graph)? {}

        let summary = RunSummary {
            rounds: self.round - first_round,
            signals: self.n_signals - first_signals,
            elapsed: now.elapsed(),
        };
        info!(
            rounds = summary.rounds,
            signals = summary.signals,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "engine finished"
        );
        Ok(summary)
    }
}
