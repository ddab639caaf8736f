// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Producer backed by an external `git log` process

use std::ffi::OsString;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, Command, Stdio};
use std::thread;

use tracing::{debug, info};

use crate::error::LogError;
use crate::parser::{LOG_FORMAT, RecordReader, parse_record};
use crate::producer::{
    CommitStreamProducer, DemandGate, EventSink, ProducerEvent, ProducerHandle, StreamEnd, drain,
    spawn_producer,
};
use crate::query::{LogQuery, RefScope};

/// Lists commits by spawning `git log` and parsing its output as it streams
#[derive(Debug, Clone)]
pub struct GitLogProducer {
    workdir: PathBuf,
    program: OsString,
    fixed_args: Option<Vec<OsString>>,
}

impl GitLogProducer {
    /// Producer for the repository at `workdir`, using `git` from `PATH`
    #[must_use]
    pub fn new(workdir: impl AsRef<Path>) -> Self {
        Self {
            workdir: workdir.as_ref().to_path_buf(),
            program: OsString::from("git"),
            fixed_args: None,
        }
    }

    /// Use a different git executable
    #[must_use]
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Run `program args...` verbatim instead of `git log`. Its stdout must
    /// use the record format from [`crate::parser`].
    #[must_use]
    pub fn custom<I, S>(workdir: impl AsRef<Path>, program: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            workdir: workdir.as_ref().to_path_buf(),
            program: program.into(),
            fixed_args: Some(args.into_iter().map(Into::into).collect()),
        }
    }

    /// Arguments passed to the process for `query`
    #[must_use]
    pub fn args(&self, query: &LogQuery) -> Vec<OsString> {
        if let Some(args) = &self.fixed_args {
            return args.clone();
        }
        let mut args: Vec<OsString> = ["log", "-z", "--no-color", "--decorate=full", LOG_FORMAT]
            .into_iter()
            .map(OsString::from)
            .collect();
        match query.scope {
            RefScope::AllRefs => args.push("--all".into()),
            RefScope::CurrentBranch => args.push("HEAD".into()),
        }
        args.push("--".into());
        args
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

impl CommitStreamProducer for GitLogProducer {
    fn start(
        &self,
        query: &LogQuery,
        initial_depth: usize,
        sink: EventSink,
    ) -> Result<ProducerHandle, LogError> {
        let child = Command::new(&self.program)
            .args(self.args(query))
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| LogError::ProducerStart {
                program: self.program_name(),
                source,
            })?;
        let mut process = LogProcess { child };

        info!(
            generation = %sink.generation(),
            pid = process.child.id(),
            program = %self.program_name(),
            "Started log process"
        );

        let stdout = process
            .child
            .stdout
            .take()
            .ok_or_else(|| LogError::ProducerStart {
                program: self.program_name(),
                source: std::io::Error::other("stdout was not captured"),
            })?;
        let stderr = process.child.stderr.take();

        let gate = DemandGate::new(initial_depth);
        let handle = ProducerHandle::new(sink.generation(), gate.clone());
        let query = query.clone();

        spawn_producer("revgraph-git-log", move || {
            let stderr = stderr.map(collect_stderr);
            let records = RecordReader::new(BufReader::new(stdout)).map(|chunk| {
                chunk
                    .map_err(LogError::from)
                    .and_then(|raw| parse_record(&raw))
            });
            let end = drain(records, &query, &gate, &sink);
            let terminal = finish(&mut process.child, stderr, end);
            drop(process);
            debug!(generation = %sink.generation(), ?terminal, "Log process finished");
            sink.send(terminal);
        })?;

        Ok(handle)
    }
}

fn collect_stderr(mut stderr: ChildStderr) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut text = String::new();
        let _ = stderr.read_to_string(&mut text);
        text
    })
}

fn stop(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// A spawned log process, killed and reaped when dropped
struct LogProcess {
    child: Child,
}

impl Drop for LogProcess {
    fn drop(&mut self) {
        stop(&mut self.child);
    }
}

fn finish(
    child: &mut Child,
    stderr: Option<thread::JoinHandle<String>>,
    end: StreamEnd,
) -> ProducerEvent {
    match end {
        StreamEnd::Cancelled => {
            stop(child);
            ProducerEvent::Cancelled
        }
        StreamEnd::LimitReached(count) => {
            stop(child);
            ProducerEvent::Completed { count }
        }
        StreamEnd::Failed(error) => {
            stop(child);
            ProducerEvent::Failed(error)
        }
        StreamEnd::Exhausted(count) => match child.wait() {
            Ok(status) if status.success() => ProducerEvent::Completed { count },
            Ok(status) => ProducerEvent::Failed(LogError::ProcessExit {
                status: status.to_string(),
                stderr: stderr
                    .and_then(|h| h.join().ok())
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            }),
            Err(error) => ProducerEvent::Failed(error.into()),
        },
    }
}
