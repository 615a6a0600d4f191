//! Per-module settings minimization.
//!
//! Each compile record carries its full command line. To keep project files
//! readable, every axis gets a module default (the most common canonical
//! value) and only sources that differ carry an override.

use indexmap::IndexMap;
use rebuild_trace::{ActionKind, BuildRecord};
use std::fmt;

/// An independently minimized category of compiler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    /// Generic compiler flags.
    Flags,
    /// Flags for both C and C++ compiles.
    CcFlags,
    /// Flags for C++ compiles only.
    CxxFlags,
    /// Preprocessor flags.
    CppFlags,
    /// Include search paths.
    Include,
    /// Preprocessor definitions.
    Define,
}

impl Axis {
    /// Axes rendered into the compiler's additional options.
    pub const FLAGS: [Axis; 4] = [Axis::Flags, Axis::CcFlags, Axis::CxxFlags, Axis::CppFlags];

    pub const ALL: [Axis; 6] = [
        Axis::Flags,
        Axis::CcFlags,
        Axis::CxxFlags,
        Axis::CppFlags,
        Axis::Include,
        Axis::Define,
    ];

    /// Attribute name in the build trace.
    pub fn key(self) -> &'static str {
        match self {
            Axis::Flags => "flags",
            Axis::CcFlags => "ccflags",
            Axis::CxxFlags => "cxxflags",
            Axis::CppFlags => "cppflags",
            Axis::Include => "include",
            Axis::Define => "define",
        }
    }

    /// Only the C++ compiler reads this axis; C compiles ignore it.
    pub fn is_cxx_only(self) -> bool {
        self == Axis::CxxFlags
    }

    pub fn is_flags(self) -> bool {
        Axis::FLAGS.contains(&self)
    }

    /// Separator used when rendering a value.
    pub fn separator(self) -> &'static str {
        if self.is_flags() {
            " "
        } else {
            ";"
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Canonical value of one axis: an ordered list of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SettingValue(Vec<String>);

impl SettingValue {
    pub fn new(entries: Vec<String>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn join(&self, separator: &str) -> String {
        self.0.join(separator)
    }

    /// If this value is `base` followed by more entries, those entries.
    pub fn extension_of(&self, base: &SettingValue) -> Option<&[String]> {
        if self.0.len() > base.0.len() && self.0.starts_with(&base.0) {
            Some(&self.0[base.0.len()..])
        } else {
            None
        }
    }

    /// This value followed by `extra`.
    pub fn extended(&self, extra: &SettingValue) -> SettingValue {
        let mut entries = self.0.clone();
        entries.extend(extra.0.iter().cloned());
        SettingValue(entries)
    }
}

/// A per-source delta from the module default for one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Override {
    /// The default followed by these entries.
    Extend(SettingValue),
    /// A different value altogether.
    Replace(SettingValue),
}

impl Override {
    /// Delta that turns `default` into `value`. `value` must differ.
    pub fn between(default: Option<&SettingValue>, value: SettingValue) -> Self {
        match default.and_then(|d| value.extension_of(d)) {
            Some(extra) => Override::Extend(SettingValue(extra.to_vec())),
            None => Override::Replace(value),
        }
    }

    /// The value this override produces on top of `default`.
    pub fn apply(&self, default: Option<&SettingValue>) -> SettingValue {
        match self {
            Override::Extend(extra) => default.cloned().unwrap_or_default().extended(extra),
            Override::Replace(value) => value.clone(),
        }
    }
}

/// Turns raw trace text into canonical setting values.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    removed_flags: Vec<String>,
}

impl Normalizer {
    pub fn new(removed_flags: Vec<String>) -> Self {
        Self { removed_flags }
    }

    pub fn normalize(&self, axis: Axis, raw: &str) -> SettingValue {
        match axis {
            Axis::Flags | Axis::CcFlags | Axis::CxxFlags | Axis::CppFlags => SettingValue(
                raw.split_whitespace()
                    .filter(|token| !self.removed_flags.iter().any(|f| f == token))
                    .map(str::to_string)
                    .collect(),
            ),
            Axis::Include => SettingValue(dedup(
                prefixed_entries(raw, &["/I", "-I"])
                    .into_iter()
                    .map(root_relative)
                    .collect(),
            )),
            Axis::Define => SettingValue(dedup(prefixed_entries(raw, &["/D", "-D"]))),
        }
    }

    /// Canonical library search paths of a link record.
    pub fn library_paths(&self, raw: &str) -> SettingValue {
        SettingValue(dedup(
            prefixed_entries(raw, &["/LIBPATH:", "-L"])
                .into_iter()
                .map(root_relative)
                .collect(),
        ))
    }
}

/// Split `/Ia /I b c` style text into entries. A token carrying one of the
/// prefixes starts an entry; a bare prefix takes the next token; other
/// tokens continue the current entry (paths with spaces). Text without any
/// prefix is read as an already canonical `;` list.
fn prefixed_entries(raw: &str, prefixes: &[&str]) -> Vec<String> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if !tokens.iter().any(|t| prefixes.iter().any(|p| t.starts_with(p))) {
        return raw
            .split(';')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect();
    }

    let mut entries: Vec<String> = Vec::new();
    let mut open = false;
    for token in tokens {
        match prefixes.iter().find_map(|p| token.strip_prefix(p)) {
            Some(rest) => {
                entries.push(rest.to_string());
                open = true;
            }
            None => match entries.last_mut() {
                Some(last) if open && !last.is_empty() => {
                    last.push(' ');
                    last.push_str(token);
                }
                Some(last) if open => last.push_str(token),
                _ => entries.push(token.to_string()),
            },
        }
    }
    entries
        .into_iter()
        .map(|e| e.trim_end_matches(';').trim().to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Relative paths are relative to the source root, which the generated
/// projects know as `$(SolutionDir)`.
fn root_relative(entry: String) -> String {
    let bytes = entry.as_bytes();
    let rooted = entry.starts_with('\\')
        || entry.starts_with('/')
        || entry.starts_with("$(")
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':');
    if rooted {
        entry
    } else {
        format!("$(SolutionDir)\\{entry}")
    }
}

fn dedup(entries: Vec<String>) -> Vec<String> {
    let mut seen = rustc_hash::FxHashSet::default();
    entries.into_iter().filter(|e| seen.insert(e.clone())).collect()
}

/// Module defaults and per-source overrides for the minimized axes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleSettings {
    defaults: IndexMap<Axis, SettingValue>,
    overrides: IndexMap<String, IndexMap<Axis, Override>>,
}

impl ModuleSettings {
    pub fn defaults(&self) -> &IndexMap<Axis, SettingValue> {
        &self.defaults
    }

    pub fn default_for(&self, axis: Axis) -> Option<&SettingValue> {
        self.defaults.get(&axis)
    }

    /// Sources with at least one override.
    pub fn overrides(&self) -> &IndexMap<String, IndexMap<Axis, Override>> {
        &self.overrides
    }

    pub fn overrides_for(&self, source: &str) -> Option<&IndexMap<Axis, Override>> {
        self.overrides.get(source)
    }

    pub fn override_for(&self, source: &str, axis: Axis) -> Option<&Override> {
        self.overrides.get(source)?.get(&axis)
    }

    /// Value of `axis` for `source`: its override applied to the default.
    pub fn effective(&self, source: &str, axis: Axis) -> Option<SettingValue> {
        match self.override_for(source, axis) {
            Some(delta) => Some(delta.apply(self.default_for(axis))),
            None => self.default_for(axis).cloned(),
        }
    }
}

/// Compute module defaults and overrides from the compile records of one
/// module.
///
/// The default of an axis is its most frequent canonical value; ties go to
/// the value seen first. Records without an axis do not vote on it and get
/// no override for it. C compiles drop the C++-only axis first.
pub fn minimize(records: &[&BuildRecord], axes: &[Axis], normalizer: &Normalizer) -> ModuleSettings {
    let canonical: Vec<(&str, Vec<(Axis, SettingValue)>)> = records
        .iter()
        .map(|record| {
            let values = axes
                .iter()
                .filter(|axis| !(record.kind() == ActionKind::CompileC && axis.is_cxx_only()))
                .filter_map(|&axis| {
                    record
                        .attr(axis.key())
                        .map(|raw| (axis, normalizer.normalize(axis, raw)))
                })
                .collect();
            (record.source().unwrap_or(record.target()), values)
        })
        .collect();

    let mut votes: IndexMap<Axis, IndexMap<&SettingValue, usize>> = IndexMap::new();
    for (_, values) in &canonical {
        for (axis, value) in values {
            *votes.entry(*axis).or_default().entry(value).or_insert(0) += 1;
        }
    }

    let mut defaults = IndexMap::new();
    for &axis in axes {
        let Some(counts) = votes.get(&axis) else {
            continue;
        };
        let mut best: Option<(&SettingValue, usize)> = None;
        for (value, &count) in counts {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((value, count));
            }
        }
        if let Some((value, _)) = best {
            defaults.insert(axis, value.clone());
        }
    }

    let mut overrides: IndexMap<String, IndexMap<Axis, Override>> = IndexMap::new();
    for (source, values) in &canonical {
        let deltas: IndexMap<Axis, Override> = values
            .iter()
            .filter(|(axis, value)| defaults.get(axis) != Some(value))
            .map(|(axis, value)| (*axis, Override::between(defaults.get(axis), value.clone())))
            .collect();
        if !deltas.is_empty() {
            overrides.insert(source.to_string(), deltas);
        }
    }

    ModuleSettings { defaults, overrides }
}
