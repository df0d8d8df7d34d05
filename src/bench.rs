//! Small timing harness for the `benches/` targets.

use std::fs;
use std::io::{self, stdout, Write};
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct Benchmark {
    f: Rc<dyn Fn()>,
    name: String,
    iterations: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Unit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
}

impl Unit {
    pub fn format(&self, d: &Duration, width: usize) -> String {
        let (symbol, value) = match self {
            Self::Nanosecond => ("ns", d.as_nanos()),
            Self::Microsecond => ("µs", d.as_micros()),
            Self::Millisecond => ("ms", d.as_millis()),
            Self::Second => ("s", d.as_secs() as u128),
        };
        format!("{:>width$}{:<2}", value, symbol)
    }

    /// Largest unit in which `d` is still below `threshold`.
    pub fn scaled(d: &Duration, threshold: u128) -> Self {
        if d.as_nanos() < threshold {
            Self::Nanosecond
        } else if d.as_micros() < threshold {
            Self::Microsecond
        } else if d.as_millis() < threshold {
            Self::Millisecond
        } else {
            Self::Second
        }
    }
}

impl Benchmark {
    pub fn iter<F: Fn() + 'static>(name: &str, n: usize, f: F) -> Self {
        Self {
            f: Rc::new(f),
            name: name.to_string(),
            iterations: n.max(1),
        }
    }

    fn run(&self) -> Duration {
        let start = Instant::now();
        for _ in 0..self.iterations {
            (self.f)();
        }
        start.elapsed()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BenchResult {
    pub name: String,
    pub iterations: usize,
    pub total: Duration,
}

impl BenchResult {
    pub fn per_call(&self) -> Duration {
        self.total.div_f64(self.iterations as f64)
    }
}

#[derive(Default)]
pub struct BenchmarkReport {
    benches: Vec<Benchmark>,
    results: Vec<BenchResult>,
}

impl BenchmarkReport {
    pub fn with_benches(benches: Vec<Benchmark>) -> Self {
        Self {
            benches,
            results: vec![],
        }
    }

    pub fn results(&self) -> &[BenchResult] {
        &self.results
    }

    pub fn run(&mut self) {
        for bench in &self.benches {
            let total = bench.run();
            self.results.push(BenchResult {
                name: bench.name.clone(),
                iterations: bench.iterations,
                total,
            });
            print!(".");
            let _ = stdout().flush();
        }
        println!();
    }

    pub fn show(&self) {
        println!(
            "  {: <36} {: >8}   {: >8}",
            "benchmark", "total", "per_call"
        );
        for result in &self.results {
            let per_call = result.per_call();
            println!(
                "  {: <36} {}   {}",
                result.name,
                Unit::scaled(&result.total, 100000).format(&result.total, 6),
                Unit::scaled(&per_call, 100000).format(&per_call, 6),
            )
        }
    }

    pub fn to_csv(&self) -> String {
        let mut lines = vec!["benchmark,total_us,iterations,per_call_us".to_string()];
        for result in &self.results {
            lines.push(format!(
                "{},{},{},{}",
                result.name,
                result.total.as_micros(),
                result.iterations,
                result.per_call().as_micros(),
            ));
        }
        lines.push(String::new());
        lines.join("\n")
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, self.to_csv())
    }

    pub fn report(&mut self, name: &str) -> io::Result<()> {
        print!("Benchmark: {}", name);
        self.run();
        self.show();
        self.write_csv(format!("benchmark_{}.csv", name))
    }
}
