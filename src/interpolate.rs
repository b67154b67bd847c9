//! `<% ... %>` interpolation in string values.
//!
//! Text outside markers is copied verbatim. Inside a marker (the `=` after
//! `<%` and surrounding whitespace are optional):
//!
//! | Marker | Result |
//! |--------|--------|
//! | `<%= ENV['HOME'] %>` | value of `$HOME` |
//! | `<%= ENV("A") ENV[B] %>` | `$A` followed by `$B` |
//! | `<%= BUNDLES['data/map.bin'] %>` | absolute path of the file in the bundles |
//! | `<%= anything else %>` | `anything else` |
//!
//! Brackets or parentheses and single, double or no quotes are all accepted
//! around arguments. A marker mentioning `ENV` is treated as an environment
//! lookup even if it also mentions `BUNDLES`.
//!
//! A `<%` with no closing `%>` is not copied through as text: the whole
//! string fails with [`ReflectfigError::MalformedMarker`], as does an `ENV`
//! or `BUNDLES` marker without an argument. A stray `%>` outside any marker
//! is ordinary text.

use std::sync::LazyLock;

use regex::Regex;

use crate::bundle::PathResolver;
use crate::env::{Environment, UndefinedEnv};
use crate::error::ReflectfigError;

const OPEN: &str = "<%";
const CLOSE: &str = "%>";

static ENV_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"ENV\s*[\[(]\s*['"]?([^'"\[\]()]*?)['"]?\s*[\])]"#).expect("valid ENV regex")
});

static BUNDLES_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"BUNDLES\s*[\[(]\s*['"]?([^'"\[\]()]*?)['"]?\s*[\])]"#)
        .expect("valid BUNDLES regex")
});

/// Resolves markers against an environment and the bundle paths.
pub struct Interpolator<'a> {
    env: &'a Environment,
    resolver: &'a dyn PathResolver,
    undefined_env: UndefinedEnv,
}

impl<'a> Interpolator<'a> {
    pub fn new(
        env: &'a Environment,
        resolver: &'a dyn PathResolver,
        undefined_env: UndefinedEnv,
    ) -> Self {
        Self {
            env,
            resolver,
            undefined_env,
        }
    }

    /// Replace every marker in `text`.
    pub fn resolve(&self, text: &str) -> Result<String, ReflectfigError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find(OPEN) {
            out.push_str(&rest[..start]);
            let after = &rest[start + OPEN.len()..];
            let Some(end) = after.find(CLOSE) else {
                return Err(malformed(text, "missing closing '%>'"));
            };
            let content = after[..end].trim_start().trim_start_matches('=').trim();
            self.expand(text, content, &mut out)?;
            rest = &after[end + CLOSE.len()..];
        }

        out.push_str(rest);
        Ok(out)
    }

    fn expand(&self, text: &str, content: &str, out: &mut String) -> Result<(), ReflectfigError> {
        if content.contains("ENV") {
            for name in arguments(&ENV_ARG, text, content)? {
                match (self.env.var(name), self.undefined_env) {
                    (Some(value), _) => out.push_str(&value),
                    (None, UndefinedEnv::Empty) => {}
                    (None, UndefinedEnv::Error) => {
                        return Err(ReflectfigError::EnvVarUndefined(name.to_string()));
                    }
                }
            }
        } else if content.contains("BUNDLES") {
            for relative in arguments(&BUNDLES_ARG, text, content)? {
                let path = self.resolver.find_file(relative)?;
                out.push_str(&path.to_string_lossy());
            }
        } else {
            out.push_str(content);
        }
        Ok(())
    }
}

fn arguments<'c>(
    pattern: &Regex,
    text: &str,
    content: &'c str,
) -> Result<Vec<&'c str>, ReflectfigError> {
    let args: Vec<&str> = pattern
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|arg| !arg.is_empty())
        .collect();
    if args.is_empty() {
        return Err(malformed(text, "marker has no argument"));
    }
    Ok(args)
}

fn malformed(text: &str, reason: &str) -> ReflectfigError {
    ReflectfigError::MalformedMarker {
        text: text.to_string(),
        reason: reason.to_string(),
    }
}
