//! The pattern notation: rule-field text into structured patterns.
//!
//! Splitting is bracket-nesting-aware throughout, so a nonce category
//! `[a,b]` survives the comma-split of a target list and an optional group
//! `(ab)` survives the space-split of a pattern. The bracket kinds are:
//! `(...)` optional groups, `[...]` category references, `{...}` reserved
//! subset notation (rejected, not silently dropped).
//!
//! Category references come in three shapes:
//! `[V]` (named), `[a,b,c]` (nonce, written inline), and `[C+voiced-labial]`
//! (feature-filtered: each `+feat` intersects, each `-feat` subtracts, in
//! writing order; `feat` is a feature of the base category or a named
//! category in the store).

use crate::category::{Category, CategoryStore};
use crate::error::RuleError;
use crate::pattern::{Atom, Environment, Pattern, Target, TargetKind};
use crate::tokenizer::Graphemes;

fn closer_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Split `text` on `sep` at nesting level zero. Unbalanced or mismatched
/// brackets fail; separators inside brackets are preserved.
pub fn nest_split(text: &str, sep: char) -> Result<Vec<String>, RuleError> {
    let mut parts = vec![String::new()];
    let mut stack: Vec<char> = Vec::new();
    for ch in text.chars() {
        match ch {
            '(' | '[' | '{' => {
                stack.push(closer_for(ch));
                parts.last_mut().unwrap().push(ch);
            }
            ')' | ']' | '}' => match stack.pop() {
                Some(expected) if expected == ch => parts.last_mut().unwrap().push(ch),
                _ => {
                    return Err(RuleError::format_err(&format!(
                        "unbalanced '{ch}' in '{text}'"
                    )))
                }
            },
            c if c == sep && stack.is_empty() => parts.push(String::new()),
            c => parts.last_mut().unwrap().push(c),
        }
    }
    if !stack.is_empty() {
        return Err(RuleError::format_err(&format!("unclosed bracket in '{text}'")));
    }
    Ok(parts)
}

/// Cut pattern text into chunks: each chunk is either a complete bracket
/// group or a run of bare literal text. Whitespace separates chunks.
fn chunk_pattern(text: &str) -> Result<Vec<String>, RuleError> {
    let mut chunks: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut stack: Vec<char> = Vec::new();
    for ch in text.chars() {
        match ch {
            '(' | '[' | '{' => {
                if stack.is_empty() && !cur.is_empty() {
                    chunks.push(std::mem::take(&mut cur));
                }
                stack.push(closer_for(ch));
                cur.push(ch);
            }
            ')' | ']' | '}' => match stack.pop() {
                Some(expected) if expected == ch => {
                    cur.push(ch);
                    if stack.is_empty() {
                        chunks.push(std::mem::take(&mut cur));
                    }
                }
                _ => {
                    return Err(RuleError::format_err(&format!(
                        "unbalanced '{ch}' in '{text}'"
                    )))
                }
            },
            c if c.is_whitespace() && stack.is_empty() => {
                if !cur.is_empty() {
                    chunks.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }
    if !stack.is_empty() {
        return Err(RuleError::format_err(&format!("unclosed bracket in '{text}'")));
    }
    if !cur.is_empty() {
        chunks.push(cur);
    }
    Ok(chunks)
}

/// Resolve the inside of a `[...]` reference to a category.
fn parse_catref(inner: &str, cats: &CategoryStore) -> Result<Category, RuleError> {
    let inner = inner.trim();
    if inner.is_empty() {
        return Err(RuleError::format_err("empty category reference"));
    }
    if inner.contains(',') {
        // nonce category, written out in place
        return Ok(Category::new(cats.resolve_values(inner)?));
    }
    let Some(op_at) = inner.find(['+', '-']) else {
        return Ok(cats.get(inner)?.clone());
    };
    if op_at == 0 {
        return Err(RuleError::format_err(&format!(
            "feature filter without a base category in '[{inner}]'"
        )));
    }
    let base = cats.get(inner[..op_at].trim())?.clone();
    let mut cat = base.clone();
    let mut rest = &inner[op_at..];
    while !rest.is_empty() {
        let op = rest.chars().next().unwrap();
        let next = rest[1..].find(['+', '-']).map(|i| i + 1).unwrap_or(rest.len());
        let feat = rest[1..next].trim();
        if feat.is_empty() {
            return Err(RuleError::format_err(&format!(
                "dangling '{op}' in category reference '[{inner}]'"
            )));
        }
        let filter = match base.feature(feat) {
            Some(values) => Category::new(values.to_vec()),
            None => cats.get(feat)?.clone(),
        };
        cat = if op == '+' { cat.intersection(&filter) } else { cat.difference(&filter) };
        rest = &rest[next..];
    }
    Ok(cat)
}

/// Parse pattern text into atoms under the given category store and
/// orthography (polygraphs in literal text become single atoms).
pub fn parse_pattern(
    text: &str,
    cats: &CategoryStore,
    graphs: &Graphemes,
) -> Result<Pattern, RuleError> {
    let mut atoms = Vec::new();
    for chunk in chunk_pattern(text)? {
        if let Some(body) = chunk.strip_prefix('(') {
            let body = body
                .strip_suffix(')')
                .ok_or_else(|| RuleError::format_err(&format!("unbalanced '(' in '{text}'")))?;
            let sub = parse_pattern(body, cats, graphs)?;
            if sub.is_empty() {
                return Err(RuleError::format_err("empty optional group '()'"));
            }
            atoms.push(Atom::Optional(sub));
        } else if let Some(body) = chunk.strip_prefix('[') {
            let body = body
                .strip_suffix(']')
                .ok_or_else(|| RuleError::format_err(&format!("unbalanced '[' in '{text}'")))?;
            atoms.push(Atom::Category(parse_catref(body, cats)?));
        } else if chunk.starts_with('{') {
            return Err(RuleError::format_err("'{...}' subset notation is reserved"));
        } else {
            for tok in graphs.segment(&chunk) {
                atoms.push(match tok.as_str() {
                    "#" => Atom::Boundary,
                    "*" => Atom::Wildcard,
                    "%" => Atom::TargetRef(TargetKind::Matched),
                    "<" => Atom::TargetRef(TargetKind::Reversed),
                    "_" => {
                        return Err(RuleError::format_err(
                            "'_' marks the target slot and belongs in environments only",
                        ))
                    }
                    _ => Atom::Literal(tok),
                });
            }
        }
    }
    Ok(Pattern::new(atoms))
}

/// Parse a target field: comma-separated targets, each with an optional
/// `@ordinal|ordinal|...` count selector (0-based).
pub fn parse_targets(
    text: &str,
    cats: &CategoryStore,
    graphs: &Graphemes,
) -> Result<Vec<Target>, RuleError> {
    let mut out = Vec::new();
    for part in nest_split(text, ',')? {
        let part = part.trim();
        let (pattern_text, count) = match part.split_once('@') {
            Some((p, sel)) => {
                let count = sel
                    .split('|')
                    .map(|n| {
                        n.trim().parse::<usize>().map_err(|_| {
                            RuleError::format_err(&format!("bad count selector '{sel}'"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                (p.trim(), count)
            }
            None => (part, Vec::new()),
        };
        let pattern = parse_pattern(pattern_text, cats, graphs)?;
        if pattern.any_atom(&|a| matches!(a, Atom::TargetRef(_))) {
            return Err(RuleError::format_err("'%' and '<' are not allowed in targets"));
        }
        out.push(Target::new(pattern, count));
    }
    Ok(out)
}

/// Parse a replacement field: comma-separated patterns. Optional groups make
/// no sense in something being written out, and are rejected.
pub fn parse_replacements(
    text: &str,
    cats: &CategoryStore,
    graphs: &Graphemes,
) -> Result<Vec<Pattern>, RuleError> {
    if text.contains('(') || text.contains(')') {
        return Err(RuleError::format_err("optional groups are not allowed in replacements"));
    }
    let mut out = Vec::new();
    for part in nest_split(text, ',')? {
        out.push(parse_pattern(part.trim(), cats, graphs)?);
    }
    Ok(out)
}

fn local_env(
    left: &str,
    right: &str,
    cats: &CategoryStore,
    graphs: &Graphemes,
) -> Result<Environment, RuleError> {
    Ok(Environment::Local {
        // stored mirrored: matched outward from the target
        before: parse_pattern(left, cats, graphs)?.mirror(),
        after: parse_pattern(right, cats, graphs)?,
    })
}

/// Parse an environment field: `|`-separated environments. Each is either
/// `left _ right` (adjacent context), a bare pattern (occurs anywhere in the
/// word), or `~pat` shorthand for `pat _ | _ pat`.
pub fn parse_environments(
    text: &str,
    cats: &CategoryStore,
    graphs: &Graphemes,
) -> Result<Vec<Environment>, RuleError> {
    let mut out = Vec::new();
    if text.trim().is_empty() {
        return Ok(out);
    }
    for part in nest_split(text, '|')? {
        let part = part.trim();
        if let Some(body) = part.strip_prefix('~') {
            out.push(local_env(body, "", cats, graphs)?);
            out.push(local_env("", body, cats, graphs)?);
            continue;
        }
        match part.matches('_').count() {
            0 => out.push(Environment::Anywhere(parse_pattern(part, cats, graphs)?)),
            1 => {
                let (left, right) = part.split_once('_').unwrap();
                out.push(local_env(left, right, cats, graphs)?);
            }
            _ => {
                return Err(RuleError::format_err(
                    "an environment may contain at most one '_'",
                ))
            }
        }
    }
    Ok(out)
}
