use std::{fmt::Write, hash::Hash, marker::PhantomData, time::SystemTime};

use verbo_core::Record;

pub(crate) trait Formatter<T: ?Sized> {
    fn fmt(dest: &mut String, v: &T);
}

// Rfc3339Weak

pub(crate) struct Rfc3339Weak;

impl Formatter<SystemTime> for Rfc3339Weak {
    fn fmt(out: &mut String, v: &SystemTime) {
        let t_idx = out.len() + 10;
        let _ = write!(out, "{}", humantime::format_rfc3339_millis(*v));
        // Replace "T" with " ".
        out.replace_range(t_idx..t_idx + 1, " ");
        // Remove trailing "Z".
        out.pop();
    }
}

// Level

pub(crate) struct Level;

impl Formatter<Record> for Level {
    fn fmt(out: &mut String, v: &Record) {
        let _ = write!(out, "{:>8}", v.level_name);
    }
}

// ColoredLevel

pub(crate) struct ColoredLevel;

impl Formatter<Record> for ColoredLevel {
    fn fmt(out: &mut String, v: &Record) {
        let color = match v.level {
            l if l >= 50 => "\x1b[1;31m", // bold red
            l if l >= 40 => "\x1b[31m",   // red
            l if l >= 30 => "\x1b[33m",   // yellow
            l if l >= 20 => "\x1b[32m",   // green
            _ => "\x1b[37m",              // gray
        };

        out.push_str(color);
        let _ = write!(out, "{:>8}", v.level_name);
        out.push_str("\x1b[0m");
    }
}

// LoggerName

pub(crate) struct LoggerName;

impl Formatter<str> for LoggerName {
    fn fmt(out: &mut String, v: &str) {
        out.push_str(if v.is_empty() { "root" } else { v });
    }
}

// Payload

pub(crate) struct Payload;

impl Formatter<Record> for Payload {
    fn fmt(out: &mut String, v: &Record) {
        push_multiline(out, &v.message);

        // <message>\t<key>=<value>\t<key>=<value>
        for (key, value) in &v.fields {
            out.push('\t');
            out.push_str(key);
            out.push('=');
            push_value(out, value);
        }

        if let Some(error) = &v.error {
            out.push_str("\terr=");
            push_multiline(out, &error.message);
            for cause in &error.chain {
                out.push_str(": ");
                push_multiline(out, cause);
            }
        }
    }
}

// ColoredPayload

pub(crate) struct ColoredPayload;

impl Formatter<Record> for ColoredPayload {
    fn fmt(out: &mut String, v: &Record) {
        push_multiline(out, &v.message);

        for (key, value) in &v.fields {
            out.push_str("\t\x1b[1m");
            out.push_str(key);
            out.push_str("\x1b[22m=");
            push_value(out, value);
        }

        if let Some(error) = &v.error {
            out.push_str("\t\x1b[1merr\x1b[22m=\x1b[31m");
            push_multiline(out, &error.message);
            for cause in &error.chain {
                out.push_str(": ");
                push_multiline(out, cause);
            }
            out.push_str("\x1b[0m");
        }
    }
}

fn push_multiline(out: &mut String, v: &str) {
    for (idx, chunk) in v.split('\n').enumerate() {
        if idx > 0 {
            out.push_str("\\n");
        }
        out.push_str(chunk);
    }
}

fn push_value(out: &mut String, value: &serde_json::Value) {
    // Strings go bare, everything else in its JSON form.
    match value.as_str() {
        Some(s) => push_multiline(out, s),
        None => {
            let _ = write!(out, "{value}");
        }
    }
}

// ColoredByHash

/// Makes a color based on the fx hash of the value.
/// Generated colors have constant brightness.
pub(crate) struct ColoredByHash<I>(PhantomData<I>);

impl<T: Hash + ?Sized, I: Formatter<T>> Formatter<T> for ColoredByHash<I> {
    #[allow(clippy::many_single_char_names)]
    fn fmt(out: &mut String, v: &T) {
        let hash = fxhash::hash64(v);

        let y = 128f64;
        let cb = (hash % 256) as u8 as f64;
        let cr = (hash / 256 % 256) as u8 as f64;

        let r = clamp(y + 1.402 * (cr - 128.));
        let g = clamp(y - 0.344136 * (cb - 128.) - 0.714136 * (cr - 128.));
        let b = clamp(y + 1.772 * (cb - 128.));

        // ANSI escape sequence to set 24-bit foreground font color.
        let _ = write!(out, "\x1b[38;2;{};{};{}m", r, g, b);
        I::fmt(out, v);
        out.push_str("\x1b[0m");
    }
}

fn clamp(v: f64) -> u8 {
    v.max(0.).min(255.) as u8
}
