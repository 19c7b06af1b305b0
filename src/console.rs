//! Line-oriented console over an in-process sync service.

use anyhow::{Context, Result, anyhow, bail};
use sheetcast_core::storage::GrdFile;
use sheetcast_core::sync::{
    Notice, PUBLISHER_REGISTERED, PublisherSession, RecordingNotifier, Subscription,
    SyncEndpoint, SyncRequest, SyncService,
};
use sheetcast_core::{GridSize, Sheet};
use sheetcast_engine::engine::to_percent;
use std::io::{BufRead, Write};
use std::sync::Arc;

const HELP: &str = "\
Commands:
  register USER           Register a publisher
  login USER              Act as USER
  create SHEET            Create and open a sheet you publish
  open PUBLISHER SHEET    Open the latest published state of your sheet
  subscribe PUBLISHER SHEET
                          Follow someone's sheet
  set LABEL INPUT...      Write a cell (formulas start with '=')
  get LABEL               Show a cell's raw text and value
  show                    Show every non-empty cell
  publish                 Publish the open sheet
  pull                    Fetch new versions (or subscriber changes)
  push                    Send your subscribed copy back to its publisher
  updates SINCE           List published versions from id SINCE
  sheets                  List your sheets
  percent LABEL           Show a numeric cell as a percentage
  save PATH               Save the open sheet to a .grd file
  load PATH               Load a .grd file into the open sheet
  help                    This text
  quit                    Leave the console";

enum Active {
    None,
    Publisher(PublisherSession),
    Subscriber(Subscription),
}

pub struct Console<W: Write> {
    service: SyncService,
    notifier: Arc<RecordingNotifier>,
    size: GridSize,
    user: String,
    active: Active,
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(service: SyncService, user: &str, size: GridSize, out: W) -> Self {
        Console {
            service,
            notifier: Arc::new(RecordingNotifier::new()),
            size,
            user: user.to_string(),
            active: Active::None,
            out,
        }
    }

    /// Run commands until end of input or `quit`. Failing commands print an
    /// error line and the console carries on.
    pub fn run(&mut self, input: impl BufRead) -> Result<()> {
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if matches!(line, "quit" | "exit") {
                break;
            }
            self.execute(line)?;
        }
        Ok(())
    }

    /// Run one command line, reporting its outcome on the output.
    pub fn execute(&mut self, line: &str) -> Result<()> {
        let result = self.dispatch(line);
        for notice in self.notifier.drain() {
            if let Notice::Message(text) = notice {
                writeln!(self.out, "{}", text)?;
            }
        }
        if let Err(err) = result {
            tracing::debug!(command = line, error = %err, "command failed");
            writeln!(self.out, "error: {:#}", err)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, line: &str) -> Result<()> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();

        match (command, args.as_slice()) {
            ("help", _) => writeln!(self.out, "{}", HELP)?,
            ("register", [user]) => {
                self.service.register(user).into_result()?;
                writeln!(self.out, "{}", PUBLISHER_REGISTERED)?;
            }
            ("login", [user]) => {
                if !self.service.directory().exists(user) {
                    bail!("User not found: {}", user);
                }
                self.user = user.to_string();
                self.active = Active::None;
                writeln!(self.out, "Logged in as {}", user)?;
            }
            ("create", [sheet]) => {
                let session =
                    PublisherSession::new(&self.user, sheet, self.size, self.notifier.clone());
                session.create(&self.service)?;
                self.active = Active::Publisher(session);
            }
            ("open", [publisher, sheet]) => self.open(publisher, sheet)?,
            ("subscribe", [publisher, sheet]) => {
                let mut subscription =
                    Subscription::new(publisher, sheet, self.size, self.notifier.clone());
                subscription.sync(&self.service)?;
                self.active = Active::Subscriber(subscription);
            }
            ("set", [label, _, ..]) => {
                let input = skip_words(line, 2);
                let sheet = self.sheet_mut()?;
                sheet.write_label(label, input)?;
                let value = sheet.get_by_label(label)?.value;
                writeln!(self.out, "{} = {}", label.to_ascii_uppercase(), value)?;
            }
            ("get", [label]) => {
                let cell = self.sheet()?.get_by_label(label)?;
                writeln!(self.out, "{}\t{}\t{}", label.to_ascii_uppercase(), cell.raw, cell.value)?;
            }
            ("show", []) => {
                let cells = self.sheet()?.cells();
                for (cell_ref, cell) in cells {
                    writeln!(self.out, "{}\t{}\t{}", cell_ref, cell.raw, cell.value)?;
                }
            }
            ("publish", []) => match &mut self.active {
                Active::Publisher(session) => {
                    session.publish(&self.service)?;
                }
                _ => bail!("open a sheet you publish first"),
            },
            ("pull", []) => match &mut self.active {
                Active::Publisher(session) => {
                    session.pull_changes(&self.service)?;
                }
                Active::Subscriber(subscription) => {
                    subscription.sync(&self.service)?;
                }
                Active::None => bail!("no sheet open"),
            },
            ("push", []) => match &self.active {
                Active::Subscriber(subscription) => subscription.push(&self.service)?,
                _ => bail!("subscribe to a sheet first"),
            },
            ("updates", [since]) => {
                let since: usize = since.parse().context("SINCE must be a version id")?;
                let request = self.active_request()?.since(since);
                let versions = self
                    .service
                    .get_updates_for_subscription(&request)
                    .into_result()?;
                for entry in versions {
                    writeln!(self.out, "{}\t{}", entry.id.unwrap_or_default(), entry.payload)?;
                }
            }
            ("sheets", []) => {
                let request = SyncRequest::new(&self.user, "");
                for entry in self.service.get_sheets(&request).into_result()? {
                    writeln!(self.out, "{}", entry.sheet)?;
                }
            }
            ("percent", [label]) => {
                let value = self.sheet()?.get_by_label(label)?.value;
                let percent =
                    to_percent(&value).ok_or_else(|| anyhow!("{} is not a number", value))?;
                writeln!(self.out, "{}", percent)?;
            }
            ("save", [path]) => {
                let mut file = GrdFile::new(*path);
                self.sheet_mut()?.save_to(&mut file)?;
                writeln!(self.out, "Saved {}", path)?;
            }
            ("load", [path]) => {
                let file = GrdFile::new(*path);
                let count = self.sheet_mut()?.load_from(&file)?;
                writeln!(self.out, "Loaded {} cell(s)", count)?;
            }
            _ => bail!("unknown or malformed command: {} (try 'help')", line),
        }
        Ok(())
    }

    /// Load the latest published state of one of the user's own sheets.
    fn open(&mut self, publisher: &str, sheet: &str) -> Result<()> {
        if publisher != self.user {
            bail!("Unauthorized: sender is not owner of sheet");
        }
        let request = SyncRequest::new(publisher, sheet);
        let versions = self
            .service
            .get_updates_for_subscription(&request)
            .into_result()?;
        let mut session =
            PublisherSession::new(&self.user, sheet, self.size, self.notifier.clone());
        if let Some(latest) = versions.last() {
            session.sheet.replace_with_payload(&latest.payload)?;
            session.sheet.modified = false;
        }
        writeln!(self.out, "Opened {} ({} version(s))", sheet, versions.len())?;
        self.active = Active::Publisher(session);
        Ok(())
    }

    fn active_request(&self) -> Result<SyncRequest> {
        match &self.active {
            Active::Publisher(session) => Ok(SyncRequest::new(&session.user, &session.sheet.name)),
            Active::Subscriber(subscription) => Ok(SyncRequest::new(
                &subscription.publisher,
                &subscription.sheet.name,
            )),
            Active::None => Err(anyhow!("no sheet open")),
        }
    }

    fn sheet(&self) -> Result<&Sheet> {
        match &self.active {
            Active::Publisher(session) => Ok(&session.sheet),
            Active::Subscriber(subscription) => Ok(&subscription.sheet),
            Active::None => Err(anyhow!("no sheet open")),
        }
    }

    fn sheet_mut(&mut self) -> Result<&mut Sheet> {
        match &mut self.active {
            Active::Publisher(session) => Ok(&mut session.sheet),
            Active::Subscriber(subscription) => Ok(&mut subscription.sheet),
            Active::None => Err(anyhow!("no sheet open")),
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

/// The rest of `line` after its first `n` words, inner spacing intact.
fn skip_words(line: &str, n: usize) -> &str {
    let mut rest = line.trim_start();
    for _ in 0..n {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    rest
}
