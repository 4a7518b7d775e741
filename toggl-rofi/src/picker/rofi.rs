use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};

use super::{
    encode_items, Picker, PickerConfig, PickerError, PickerHandle, PickerItem, PickerResponse,
};

/// Picker backed by a child process, `rofi -dmenu` by default.
#[derive(Debug)]
pub struct RofiPicker {
    program: String,
    base_args: Vec<String>,
    generation: u64,
    session: Option<Session>,
}

#[derive(Debug)]
struct Session {
    generation: u64,
    child: Child,
    stdin: Option<ChildStdin>,
    written: Vec<String>,
}

impl RofiPicker {
    pub fn new<I, S>(program: impl Into<String>, base_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            base_args: base_args.into_iter().map(Into::into).collect(),
            generation: 0,
            session: None,
        }
    }

    /// Pid of the live picker process, if one is open.
    pub fn active_pid(&self) -> Option<u32> {
        self.session.as_ref().and_then(|s| s.child.id())
    }

    async fn terminate_active(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        tracing::debug!(
            generation = session.generation,
            pid = ?session.child.id(),
            "terminating previous picker"
        );
        drop(session.stdin.take());
        if let Err(e) = session.child.kill().await {
            tracing::warn!("failed to terminate previous picker: {}", e);
        }
    }

    fn session_for(&mut self, handle: &PickerHandle) -> Result<&mut Session, PickerError> {
        match self.session.as_mut() {
            None => Err(PickerError::Usage("no picker is being displayed")),
            Some(session) if session.generation != handle.generation() => Err(PickerError::Usage(
                "handle belongs to a picker that was replaced",
            )),
            Some(session) => Ok(session),
        }
    }
}

#[async_trait]
impl Picker for RofiPicker {
    async fn display(&mut self, config: &PickerConfig) -> Result<PickerHandle, PickerError> {
        self.terminate_active().await;

        let args = config.args();
        tracing::debug!(program = %self.program, ?args, "launching picker");

        let mut child = Command::new(&self.program)
            .args(&self.base_args)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PickerError::Launch {
                program: self.program.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        self.generation += 1;
        self.session = Some(Session {
            generation: self.generation,
            child,
            stdin,
            written: Vec::new(),
        });
        tracing::debug!(generation = self.generation, pid = ?self.active_pid(), "picker launched");

        Ok(PickerHandle::new(self.generation))
    }

    async fn write_items(
        &mut self,
        handle: &PickerHandle,
        items: &[PickerItem],
    ) -> Result<(), PickerError> {
        let session = self.session_for(handle)?;
        let stdin = session
            .stdin
            .as_mut()
            .ok_or(PickerError::Usage("picker input is already closed"))?;

        let buf = encode_items(items);
        let written = match stdin.write_all(&buf).await {
            Ok(()) => stdin.flush().await,
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => {}
            // The user can dismiss the picker before it has read every row.
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                tracing::debug!("picker closed its input early");
                session.stdin = None;
            }
            Err(e) => return Err(PickerError::Io(e)),
        }

        session
            .written
            .extend(items.iter().map(PickerItem::display_line));
        Ok(())
    }

    async fn read(&mut self, handle: PickerHandle) -> Result<PickerResponse, PickerError> {
        self.session_for(&handle)?;
        let Some(session) = self.session.take() else {
            return Err(PickerError::Usage("no picker is being displayed"));
        };

        let Session {
            child,
            stdin,
            written,
            ..
        } = session;
        drop(stdin);

        let output = child.wait_with_output().await?;
        let exit_code = output.status.code().ok_or(PickerError::Terminated)?;
        tracing::debug!(exit_code, bytes = output.stdout.len(), "picker exited");

        Ok(PickerResponse::new(Some(output.stdout), exit_code, &written))
    }
}
