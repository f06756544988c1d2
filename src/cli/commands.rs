use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::{self, Read};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::note::NoteId;
use crate::store::{NoteOrder, NoteStore};

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// Title for the note (prompted if omitted)
    #[arg()]
    pub title: Option<String>,
    /// Provide the description inline. If omitted, reads from stdin.
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Only show notes whose title or description contains this text
    #[arg()]
    pub filter: Option<String>,
    /// Sort order (alphabetical or insertion); defaults to the configured order
    #[arg(long)]
    pub order: Option<NoteOrder>,
    /// Print each note's id after its title
    #[arg(long)]
    pub ids: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Note id, or its number in `notedown list`
    pub note: NoteRef,
    /// Replacement title
    #[arg(long)]
    pub title: Option<String>,
    /// Replacement description
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Note id, or its number in `notedown list`
    pub note: NoteRef,
}

/// How a note is named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteRef {
    Id(NoteId),
    /// 1-based alphabetical number, as printed by `notedown list` whatever
    /// the filter or order.
    Position(usize),
}

impl FromStr for NoteRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(position) = trimmed.parse::<usize>() {
            if position == 0 {
                return Err("list numbers start at 1".into());
            }
            return Ok(NoteRef::Position(position));
        }
        trimmed
            .parse::<NoteId>()
            .map(NoteRef::Id)
            .map_err(|err| format!("expected a note id or list number: {err}"))
    }
}

impl NoteRef {
    fn resolve(self, store: &NoteStore) -> Result<NoteId> {
        match self {
            NoteRef::Id(id) if store.contains(id) => Ok(id),
            NoteRef::Id(id) => bail!("note {id} not found"),
            NoteRef::Position(position) => store
                .list(None)
                .get(position.wrapping_sub(1))
                .map(|note| note.id)
                .with_context(|| format!("no note at position {position}")),
        }
    }
}

pub fn new_note(store: &mut NoteStore, args: NewArgs) -> Result<String> {
    let title = match args.title {
        Some(t) => t,
        None => prompt("Title")?,
    };
    let description = match args.description {
        Some(description) => description,
        None => match read_stdin()? {
            Some(piped) => piped,
            None => prompt("Description")?,
        },
    };

    let note = store
        .create(&title, &description)
        .context("creating note")?;
    Ok(format!("Created note {} ({})\n", note.id, note.title))
}

pub fn list_notes(store: &NoteStore, args: ListArgs, default_order: NoteOrder) -> Result<String> {
    let order = args.order.unwrap_or(default_order);
    let notes = store.list_in(order, args.filter.as_deref());
    if notes.is_empty() {
        let message = if store.is_empty() {
            "No notes yet.\n"
        } else {
            "No matches found.\n"
        };
        return Ok(message.to_string());
    }
    // Rows keep their alphabetical number so `edit`/`delete <n>` always
    // resolve to the row that was printed.
    let positions: HashMap<NoteId, usize> = store
        .list(None)
        .iter()
        .enumerate()
        .map(|(idx, note)| (note.id, idx + 1))
        .collect();
    let mut out = String::new();
    for note in &notes {
        let position = positions.get(&note.id).copied().unwrap_or_default();
        let _ = write!(&mut out, "{}. {}", position, note.title);
        if args.ids {
            let _ = write!(&mut out, "  {}", note.id);
        }
        out.push('\n');
    }
    Ok(out)
}

pub fn edit_note(store: &mut NoteStore, args: EditArgs) -> Result<String> {
    if args.title.is_none() && args.description.is_none() {
        bail!("nothing to change: pass --title and/or --description");
    }
    let id = args.note.resolve(store)?;
    let Some(current) = store.get(id).cloned() else {
        bail!("note {id} not found");
    };
    let title = args.title.unwrap_or_else(|| current.title.clone());
    let description = args
        .description
        .unwrap_or_else(|| current.description.clone());

    let updated = store
        .update(id, &title, &description)
        .with_context(|| format!("updating note {id}"))?;
    if updated == current {
        return Ok(format!("No changes to note {id}\n"));
    }
    Ok(format!("Updated note {id} ({})\n", updated.title))
}

pub fn delete_note(store: &mut NoteStore, args: DeleteArgs) -> Result<String> {
    let id = args.note.resolve(store)?;
    let title = store
        .get(id)
        .map(|note| note.title.clone())
        .unwrap_or_default();
    store
        .delete(id)
        .with_context(|| format!("deleting note {id}"))?;
    Ok(format!("Deleted note {id} ({title})\n"))
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("reading description from stdin")?;
    Ok(Some(buf))
}
