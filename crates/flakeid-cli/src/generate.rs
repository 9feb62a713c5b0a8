use crate::cli::{GenerateArgs, MachineIdSourceArg};
use anyhow::{bail, Context};
use flakeid_generator::{
    Clock, Error, FlakeId, Generator, HostnameMachineId, MachineIdProvider, Settings,
    StaticMachineId,
};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

pub fn run(args: &GenerateArgs) -> anyhow::Result<()> {
    let generator = build_generator(args)?;

    info!(
        machine_id = generator.machine_id(),
        start_time = %generator.start_time(),
        count = args.count,
        workers = args.workers,
        "generating ids"
    );

    let ids = mint(&generator, args.count, args.workers).context("failed to generate ids")?;
    ensure_unique(&ids)?;

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_ids(&ids, file)
                .with_context(|| format!("failed to write ids to {}", path.display()))?;
            info!(path = %path.display(), count = ids.len(), "ids written");
        }
        None => write_ids(&ids, io::stdout().lock()).context("failed to write ids to stdout")?,
    }

    Ok(())
}

pub fn build_generator(args: &GenerateArgs) -> anyhow::Result<Generator> {
    let provider: Arc<dyn MachineIdProvider> = match args.machine_id_source {
        MachineIdSourceArg::Static => Arc::new(StaticMachineId(args.machine_id)),
        MachineIdSourceArg::Hostname => Arc::new(HostnameMachineId::new()),
    };
    let settings = Settings {
        start_time: args.start_time,
        machine_id: Some(provider),
        check_machine_id: None,
    };

    Generator::new(settings).with_context(|| {
        format!(
            "failed to create generator from {} machine id source",
            args.machine_id_source
        )
    })
}

/// Mints `count` ids, spreading the work over `workers` threads that share
/// one generator. Ids minted by several workers are returned sorted.
pub fn mint<C: Clock>(
    generator: &Generator<C>,
    count: usize,
    workers: usize,
) -> Result<Vec<FlakeId>, Error> {
    if workers <= 1 {
        return (0..count).map(|_| generator.next_id()).collect();
    }

    let per_worker = count / workers;
    let remainder = count % workers;

    let mut ids = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let quota = per_worker + usize::from(worker < remainder);
                scope.spawn(move || {
                    debug!(worker, quota, "worker started");
                    (0..quota)
                        .map(|_| generator.next_id())
                        .collect::<Result<Vec<_>, _>>()
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            match handle.join() {
                Ok(batch) => ids.extend(batch?),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        Ok::<_, Error>(ids)
    })?;

    ids.sort_unstable();
    Ok(ids)
}

fn ensure_unique(ids: &[FlakeId]) -> anyhow::Result<()> {
    let distinct = ids.iter().collect::<HashSet<_>>().len();
    if distinct != ids.len() {
        bail!("generated {} ids but only {} are distinct", ids.len(), distinct);
    }
    info!(count = ids.len(), "all generated ids are distinct");
    Ok(())
}

pub fn write_ids<W: Write>(ids: &[FlakeId], writer: W) -> io::Result<()> {
    let mut writer = BufWriter::new(writer);
    for id in ids {
        writeln!(writer, "{id}")?;
    }
    writer.flush()
}
