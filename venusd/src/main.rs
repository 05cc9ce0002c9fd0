use structopt::StructOpt;
use venusd::cmdline::Cmdline;

fn main() {
    let cmdline = Cmdline::from_args();
    let res = match cmdline {
        Cmdline::Run {
            connection,
            dev,
            logs_dir,
            video_tape,
            script,
        } => venusd::cmd_run::run(connection, dev, logs_dir, video_tape, script),
        Cmdline::Sim { script } => venusd::cmd_sim::run(script),
    };
    if let Err(e) = res {
        eprintln!("error: {e}");
        ::std::process::exit(1);
    }
}
