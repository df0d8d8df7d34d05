use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use structopt::clap::AppSettings;
use structopt::StructOpt;

use mandeltile::error::EXIT_OK;
use mandeltile::logging::init_logging;
use mandeltile::{c, http_service, render, Palette, RenderConfig, RenderError, RetryPolicy};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "mandeltile",
    about = "Mandelbrot client rendering through a remote compute service",
    setting = AppSettings::AllowNegativeNumbers
)]
struct Cli {
    /// the mandelbrot server url
    #[structopt(short = "u", long = "url", default_value = "http://localhost:8080/")]
    url: String,

    /// the number of concurrent requests [>0]
    #[structopt(short = "c", long = "concurrent", default_value = "1")]
    concurrent: usize,

    /// the largest width or height of each sub part in pixels [>0]
    #[structopt(short = "d", long = "divisions", default_value = "1000")]
    divisions: u32,

    /// max steps per pixel
    #[structopt(short = "s", long = "steps", default_value = "1024")]
    steps: u32,

    /// per request timeout in seconds
    #[structopt(short = "t", long = "timeout", default_value = "45")]
    timeout: u64,

    /// retries per failed sub part before giving up
    #[structopt(short = "r", long = "retries", default_value = "0")]
    retries: u32,

    /// wait before the first retry, growing linearly with each attempt
    #[structopt(long = "backoff-ms", default_value = "500")]
    backoff_ms: u64,

    /// write the png here instead of stdout
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output: Option<PathBuf>,

    /// greyscale or rainbow
    #[structopt(long = "palette", default_value = "greyscale")]
    palette: Palette,

    /// more logging, repeat for trace
    #[structopt(short = "v", parse(from_occurrences))]
    verbose: u8,

    /// min_c_re [-2.0 ... 2.0]
    min_c_re: f64,
    /// min_c_im [-2.0 ... 2.0]
    min_c_im: f64,
    /// max_c_re [-2.0 ... 2.0]
    max_c_re: f64,
    /// max_c_im [-2.0 ... 2.0]
    max_c_im: f64,
    /// canvas width in pixels [>0]
    width: u32,
    /// canvas height in pixels [>0]
    height: u32,
}

impl Cli {
    fn config(&self) -> RenderConfig {
        RenderConfig {
            min_c: c(self.min_c_re, self.min_c_im),
            max_c: c(self.max_c_re, self.max_c_im),
            width: self.width,
            height: self.height,
            max_steps: self.steps,
            tile_edge: self.divisions,
            concurrency: self.concurrent,
            server_url: self.url.clone(),
            timeout: Duration::from_secs(self.timeout),
            retry: RetryPolicy::new(self.retries, Duration::from_millis(self.backoff_ms)),
        }
    }
}

fn run(cli: &Cli) -> Result<(), RenderError> {
    let config = cli.config();
    config.validate()?;
    let service = http_service(&config)?;

    match &cli.output {
        Some(path) => {
            // The file is only created once the image is complete
            let mut png = Vec::new();
            render(&config, service, cli.palette, &mut png)?;
            fs::write(path, png)?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            render(&config, service, cli.palette, &mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::from_args();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(&cli) {
        Ok(()) => process::exit(EXIT_OK),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}
