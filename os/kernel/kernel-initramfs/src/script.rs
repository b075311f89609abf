//! Recognizing the init program and reading `#!init` scripts.

use kernel_ramfs::{RamFs, RamPath};
use log::{debug, info};

const ELF_MAGIC: &[u8; 4] = b"\x7FELF";

/// What kind of program a staged `/init` is.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InitKind<'a> {
    Elf,
    /// `#!init`: a list of commands to run.
    InitScript,
    /// `#!<interpreter>`; the interpreter may be empty.
    Shebang { interpreter: &'a str },
    /// No recognizable header.
    PlainText,
}

#[must_use]
pub fn classify_init(data: &[u8]) -> InitKind<'_> {
    if data.starts_with(ELF_MAGIC) {
        return InitKind::Elf;
    }
    match shebang(data) {
        Some("init") => InitKind::InitScript,
        Some(interpreter) => InitKind::Shebang { interpreter },
        None => InitKind::PlainText,
    }
}

/// The word after `#!`, up to the first blank or line break.
fn shebang(data: &[u8]) -> Option<&str> {
    let rest = data.strip_prefix(b"#!")?;
    let start = rest
        .iter()
        .position(|&b| !is_blank(b))
        .unwrap_or(rest.len());
    let rest = &rest[start..];
    let end = rest
        .iter()
        .position(|&b| is_blank(b) || b == b'\n' || b == b'\r')
        .unwrap_or(rest.len());
    Some(core::str::from_utf8(&rest[..end]).unwrap_or_default())
}

const fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Splits on `\n`, `\r`, `\r\n` and `\n\r`.
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    rest: &'a [u8],
}

impl<'a> Lines<'a> {
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { rest: data }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.rest.is_empty() {
            return None;
        }
        let Some(end) = self.rest.iter().position(|&b| b == b'\n' || b == b'\r') else {
            let line = self.rest;
            self.rest = &[];
            return Some(line);
        };
        let line = &self.rest[..end];
        let mut next = end + 1;
        if let Some(&after) = self.rest.get(next)
            && matches!((self.rest[end], after), (b'\r', b'\n') | (b'\n', b'\r'))
        {
            next += 1;
        }
        self.rest = &self.rest[next..];
        Some(line)
    }
}

/// One line of a `#!init` script.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ScriptCommand<'a> {
    /// Run the program at this path (`file:<path>`) or of this name (a bare
    /// word). Relative names are looked up at the root, see
    /// [`RamPath::absolute`].
    Exec(&'a str),
    /// `echo <text>` or `printk <text>`.
    Echo(&'a str),
    /// A line that names nothing runnable.
    Unknown(&'a str),
}

impl<'a> ScriptCommand<'a> {
    /// Parse one line. Blank lines and `#` comments yield `None`.
    #[must_use]
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim_start_matches([' ', '\t']);
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        if let Some(path) = line.strip_prefix("file:") {
            return Some(match first_word(path) {
                "" => Self::Unknown(line),
                path => Self::exec_or_unknown(path, line),
            });
        }
        if let Some(text) = line
            .strip_prefix("echo ")
            .or_else(|| line.strip_prefix("printk "))
        {
            return Some(Self::Echo(text));
        }
        Some(Self::exec_or_unknown(first_word(line), line))
    }

    fn exec_or_unknown(name: &'a str, line: &'a str) -> Self {
        if RamPath::absolute(name).is_ok() {
            Self::Exec(name)
        } else {
            Self::Unknown(line)
        }
    }
}

fn first_word(s: &str) -> &str {
    let s = s.trim_start_matches([' ', '\t']);
    s.split([' ', '\t']).next().unwrap_or(s)
}

/// The commands of a `#!init` script, after its first line.
#[derive(Debug, Clone)]
pub struct Script<'a> {
    lines: Lines<'a>,
}

impl<'a> Script<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        let mut lines = Lines::new(data);
        lines.next();
        Self { lines }
    }
}

impl<'a> Iterator for Script<'a> {
    type Item = ScriptCommand<'a>;

    fn next(&mut self) -> Option<ScriptCommand<'a>> {
        for raw in self.lines.by_ref() {
            let Ok(line) = core::str::from_utf8(raw) else {
                debug!("script: skipping a line that is not UTF-8");
                continue;
            };
            if let Some(command) = ScriptCommand::parse(line) {
                return Some(command);
            }
        }
        None
    }
}

/// A staged `#!init` script and the program it starts.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct InitEntrypoint<'s> {
    /// Path of the script in the store.
    pub script: &'s str,
    /// The script's first `file:` directive, or the script itself.
    pub target: &'s str,
}

impl<'s> InitEntrypoint<'s> {
    /// The path to execute.
    #[must_use]
    pub const fn path(&self) -> &'s str {
        self.target
    }
}

/// Find the first file (in insertion order) that starts with `#!init`.
#[must_use]
pub fn find_init_entrypoint<'s, const FILES: usize, const NODES: usize>(
    fs: &'s RamFs<'_, FILES, NODES>,
) -> Option<InitEntrypoint<'s>> {
    let file = fs
        .files()
        .find(|f| classify_init(f.data()) == InitKind::InitScript)?;
    let script = file.path.as_str();
    let target = file_directive(file.data()).unwrap_or(script);
    info!("script: {script} is a #!init script, entrypoint {target}");
    Some(InitEntrypoint { script, target })
}

/// The path of the first `file:` line after the shebang.
fn file_directive(data: &[u8]) -> Option<&str> {
    Lines::new(data)
        .skip(1)
        .filter_map(|line| core::str::from_utf8(line).ok())
        .find_map(|line| {
            line.trim_start_matches([' ', '\t'])
                .strip_prefix("file:")
                .map(first_word)
                .filter(|path| !path.is_empty())
        })
}

/// How to start the staged init program.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InitLaunch<'s> {
    /// Load and run an ELF image.
    Elf { image: &'s [u8] },
    /// Run a `#!init` script; `script` holds the commands.
    Script {
        entrypoint: InitEntrypoint<'s>,
        script: &'s [u8],
    },
    /// Run `interpreter` (found in the store) on `/init`.
    Interpreter {
        interpreter: &'s str,
        image: &'s [u8],
    },
    /// Run the lines after the first one as commands; see [`Script`].
    CommandScript { script: &'s [u8] },
    /// No header at all; try the bytes as a flat binary.
    Raw { image: &'s [u8] },
}

/// Decide how to start the program staged at `init_path`.
///
/// Without a file at `init_path`, the first `#!init` script anywhere in the
/// store is run instead (see [`find_init_entrypoint`]). `None` if there is
/// neither.
#[must_use]
pub fn resolve_init<'s, const FILES: usize, const NODES: usize>(
    fs: &'s RamFs<'_, FILES, NODES>,
    init_path: &str,
) -> Option<InitLaunch<'s>> {
    let Some(data) = fs.get(init_path) else {
        let entrypoint = find_init_entrypoint(fs)?;
        info!("init: no {init_path}, falling back to {}", entrypoint.script);
        return Some(InitLaunch::Script {
            entrypoint,
            script: fs.get(entrypoint.script)?,
        });
    };
    let launch = match classify_init(data) {
        InitKind::Elf => InitLaunch::Elf { image: data },
        InitKind::InitScript => match find_init_entrypoint(fs) {
            Some(entrypoint) => InitLaunch::Script {
                entrypoint,
                script: fs.get(entrypoint.script).unwrap_or(data),
            },
            None => InitLaunch::CommandScript { script: data },
        },
        InitKind::Shebang { interpreter } => {
            let image = RamPath::absolute(interpreter)
                .ok()
                .and_then(|path| fs.get(path.as_str()));
            match image {
                Some(image) => InitLaunch::Interpreter { interpreter, image },
                None => {
                    debug!("init: interpreter '{interpreter}' not staged");
                    InitLaunch::CommandScript { script: data }
                }
            }
        }
        InitKind::PlainText => InitLaunch::Raw { image: data },
    };
    Some(launch)
}
