#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # edxcut
//!
//! Runs answer box unit tests against an edX course, and scaffolds test
//! declarations from course exports.
//!
//! Site settings come from `EDXCUT_*` environment variables (a `.env` file is
//! honoured), then the `config:` section of each test file, then flags.

use anyhow::{Context, Result};
use bpaf::*;
use dotenvy::dotenv;
use edxcut::{EdxClient, SiteConfig, TestRunSummary, TestSuite, TestSuiteRunner, scaffold};
use tracing::{Level, error, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Site settings given on the command line.
#[derive(Debug, Clone)]
struct SiteArgs {
    /// LMS base url
    site_base_url: Option<String>,
    /// Staff username
    username:      Option<String>,
    /// Staff password
    password:      Option<String>,
    /// Course id
    course_id:     Option<String>,
    /// Skip TLS certificate verification
    insecure:      bool,
}

impl SiteArgs {
    /// Converts the flags into a config layer.
    fn to_config(&self) -> SiteConfig {
        SiteConfig {
            site_base_url:        self.site_base_url.clone(),
            username:             self.username.clone(),
            password:             self.password.clone(),
            course_id:            self.course_id.clone(),
            accept_invalid_certs: self.insecure.then_some(true),
        }
    }
}

/// Top-level commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Run tests from declaration files
    Test(SiteArgs, Vec<String>),
    /// Print test declarations scaffolded from course exports
    MakeTests(SiteArgs, Vec<String>),
}

/// Parsed command line.
#[derive(Debug, Clone)]
struct Opts {
    /// Number of `-v` flags
    verbose: usize,
    /// Command to run
    cmd:     Cmd,
}

/// Parse the command line arguments
fn options() -> Opts {
    /// parses site settings
    fn site() -> impl Parser<SiteArgs> {
        let site_base_url = short('s')
            .long("site-base-url")
            .help("base url for course site, e.g. http://192.168.33.10")
            .argument::<String>("URL")
            .optional();
        let username = short('u')
            .long("username")
            .help("username for course site access")
            .argument::<String>("USER")
            .optional();
        let password = short('p')
            .long("password")
            .help("password for course site access")
            .argument::<String>("PASSWORD")
            .optional();
        let course_id = short('c')
            .long("course-id")
            .help("course_id, e.g. course-v1:edX+DemoX+Demo_Course")
            .argument::<String>("COURSE")
            .optional();
        let insecure = long("insecure")
            .help("do not verify TLS certificates")
            .switch();
        construct!(SiteArgs {
            site_base_url,
            username,
            password,
            course_id,
            insecure
        })
    }

    /// parses input file names
    fn files(what: &'static str) -> impl Parser<Vec<String>> {
        positional::<String>("FILE").help(what).some("at least one input file is required")
    }

    let (test_site, test_files) = (site(), files("unit test YAML file(s)"));
    let test = construct!(Cmd::Test(test_site, test_files))
        .to_options()
        .command("test")
        .help("Run answer box unit tests");

    let (export_site, export_files) = (site(), files("xbundle course export file(s)"));
    let make_tests = construct!(Cmd::MakeTests(export_site, export_files))
        .to_options()
        .command("make-tests")
        .help("Print a unit test YAML file scaffolded from course exports");

    let verbose = short('v')
        .long("verbose")
        .help("increase output verbosity (repeat for more)")
        .req_flag(())
        .many()
        .map(|flags| flags.len());
    let cmd = construct!([test, make_tests]);

    construct!(Opts { verbose, cmd })
        .to_options()
        .descr("Unit tester for edX courses")
        .run()
}

/// Maps the number of `-v` flags to a log level.
fn level_for(verbose: usize) -> LevelFilter {
    match verbose {
        0 => LevelFilter::from_level(Level::WARN),
        1 => LevelFilter::from_level(Level::INFO),
        2 => LevelFilter::from_level(Level::DEBUG),
        _ => LevelFilter::from_level(Level::TRACE),
    }
}

/// Outcome of running every declaration file.
struct RunOutcome {
    /// Counters aggregated over the files that ran.
    overall:      TestRunSummary,
    /// Files that could not be loaded or connected to.
    broken_files: usize,
}

impl RunOutcome {
    /// Returns true when every file ran and every test passed.
    fn succeeded(&self) -> bool {
        self.broken_files == 0 && self.overall.all_passed()
    }
}

/// Runs the suite declared in `file`, printing per-test lines and its summary.
fn run_file(file: &str, env_site: &SiteConfig, cli_site: &SiteConfig) -> Result<TestRunSummary> {
    let suite = TestSuite::load(file)?;
    let config = env_site.clone().overlay(suite.config()).overlay(cli_site);
    let mut client = EdxClient::connect(&config)
        .with_context(|| format!("Could not log in for tests in {file}"))?;

    println!("{} Running {} tests", "=".repeat(60), suite.len());
    println!(
        "Tests using site {} and course {}",
        config.require_site_base_url()?,
        config.require_course_id()?
    );
    println!("{}", "-".repeat(60));

    let report = {
        let mut stdout = std::io::stdout().lock();
        TestSuiteRunner::new(&mut client)
            .run(suite.tests(), &mut stdout)
            .context("Could not write test output")?
    };

    println!("{} Tests done", "=".repeat(40));
    println!("{}", report.summary);
    Ok(report.summary)
}

/// Runs every declaration file. A file that cannot be loaded or logged in
/// for is reported and skipped.
fn run_tests(site: &SiteArgs, files: &[String]) -> RunOutcome {
    let env_site = SiteConfig::from_env();
    let cli_site = site.to_config();
    let mut outcome = RunOutcome {
        overall:      TestRunSummary::default(),
        broken_files: 0,
    };

    if files.len() > 1 {
        println!("{}", "=".repeat(70));
        println!("Running tests from {} files", files.len());
    }

    for file in files {
        println!("{}", "=".repeat(70));
        println!("==>  Running tests from {file}");

        match run_file(file, &env_site, &cli_site) {
            Ok(summary) => outcome.overall = outcome.overall.merge(&summary),
            Err(err) => {
                error!("Skipping {file}: {err:#}");
                outcome.broken_files += 1;
            }
        }
    }

    println!("{}", "=".repeat(70));
    println!("Ran tests from {} files", files.len());
    if outcome.broken_files > 0 {
        println!("{} file(s) could not be run", outcome.broken_files);
    }
    println!("{}", outcome.overall.table("Overall"));
    outcome
}

/// Prints a YAML declaration scaffolded from course exports.
fn make_tests(site: &SiteArgs, files: &[String]) -> Result<()> {
    let mut suite = TestSuite::new(site.to_config());
    for file in files {
        let xml = std::fs::read_to_string(file)
            .with_context(|| format!("Could not read course export {file}"))?;
        suite.add_tests(scaffold::tests_from_xbundle(&xml));
    }
    eprintln!("{} tests added", suite.len());
    print!("{}", suite.to_yaml()?);
    Ok(())
}

fn main() -> Result<()> {
    dotenv().ok();

    let opts = options();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    tracing_subscriber::registry()
        .with(fmt)
        .with(level_for(opts.verbose))
        .init();

    match opts.cmd {
        Cmd::Test(site, files) => {
            if !run_tests(&site, &files).succeeded() {
                std::process::exit(1);
            }
        }
        Cmd::MakeTests(site, files) => make_tests(&site, &files)?,
    };

    Ok(())
}
