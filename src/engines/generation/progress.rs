use std::sync::mpsc::Sender;

/// Receives progress of a genetic programme run.
pub trait ProgressCallback {
    fn on_generation_start(&mut self, generation: usize);
    fn on_generation_complete(
        &mut self,
        generation: usize,
        best_fitness: f64,
        population_size: usize,
    );
    fn on_candidate_scored(&mut self, candidate: usize, total: usize);
}

pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        println!("Generation {} starting...", generation);
    }

    fn on_generation_complete(
        &mut self,
        generation: usize,
        best_fitness: f64,
        population_size: usize,
    ) {
        println!(
            "Generation {} complete. Best fitness: {:.2}, breeding population: {}",
            generation, best_fitness, population_size
        );
    }

    fn on_candidate_scored(&mut self, candidate: usize, total: usize) {
        if candidate % 50 == 0 || candidate == total {
            println!("  Scored {}/{} candidates", candidate, total);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    GenerationStart(usize),
    GenerationComplete {
        generation: usize,
        best_fitness: f64,
        population_size: usize,
    },
    CandidateScored { current: usize, total: usize },
}

/// Forwards progress to another thread, e.g. a front end driving the run.
pub struct ChannelProgressCallback {
    sender: Sender<ProgressMessage>,
}

impl ChannelProgressCallback {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart(generation));
    }

    fn on_generation_complete(
        &mut self,
        generation: usize,
        best_fitness: f64,
        population_size: usize,
    ) {
        let _ = self.sender.send(ProgressMessage::GenerationComplete {
            generation,
            best_fitness,
            population_size,
        });
    }

    fn on_candidate_scored(&mut self, candidate: usize, total: usize) {
        let _ = self.sender.send(ProgressMessage::CandidateScored {
            current: candidate,
            total,
        });
    }
}
