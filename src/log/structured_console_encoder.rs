use log::{
    Record,
    kv::{Error, Key, Value, VisitSource},
};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::encode::{Color, Encode, Style, Write};
use serde::Deserialize;
use std::io;

#[derive(Debug, Deserialize)]
pub struct StructuredConsoleEncoderConfig {
    pub pattern: Option<String>,
}

/// Console encoder that renders the pattern-formatted line, then appends the
/// record's key-value pairs as ` key=value` before the newline. Keys are
/// styled so they stand out from the message text.
#[derive(Debug)]
pub struct StructuredConsoleEncoder {
    delegate: PatternEncoder,
}

impl StructuredConsoleEncoder {
    pub fn new(pattern: &str) -> Self {
        Self {
            delegate: PatternEncoder::new(pattern),
        }
    }
}

impl Encode for StructuredConsoleEncoder {
    fn encode(&self, w: &mut dyn Write, record: &Record) -> anyhow::Result<()> {
        self.delegate.encode(w, record)?;

        let mut visitor = KvVisitor {
            writer: w,
            io_err: None,
        };

        if let Err(kv_err) = record.key_values().visit(&mut visitor) {
            if let Some(io_err) = visitor.io_err {
                return Err(io_err.into());
            }
            write!(w, " [KV Error: {}]", kv_err)?;
        }

        w.write_all(b"\n")?;
        Ok(())
    }
}

// VisitSource's error type cannot carry an io::Error, so the visitor parks it
// and encode() recovers it after the visit fails.
struct KvVisitor<'a> {
    writer: &'a mut dyn Write,
    io_err: Option<io::Error>,
}

impl<'a, 'kvs> VisitSource<'kvs> for KvVisitor<'a> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), Error> {
        let result = (|| {
            self.writer.set_style(Style::new().text(Color::Cyan))?;
            write!(self.writer, " {}=", key)?;

            self.writer.set_style(&Style::default())?;
            write!(self.writer, "{}", value)?;
            Ok::<(), io::Error>(())
        })();

        if let Err(e) = result {
            self.io_err = Some(e);
            return Err(Error::msg("io error during visit"));
        }

        Ok(())
    }
}

pub struct StructuredConsoleEncoderDeserializer;

impl log4rs::config::Deserialize for StructuredConsoleEncoderDeserializer {
    type Trait = dyn Encode;
    type Config = StructuredConsoleEncoderConfig;

    fn deserialize(
        &self,
        config: StructuredConsoleEncoderConfig,
        _: &log4rs::config::Deserializers,
    ) -> anyhow::Result<Box<dyn Encode>> {
        let pattern = config.pattern.as_deref().unwrap_or("{d} {l} [{t}] {m}");
        Ok(Box::new(StructuredConsoleEncoder::new(pattern)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;
    use log4rs::encode::writer::simple::SimpleWriter;

    #[test]
    fn appends_key_values_after_the_message() {
        let encoder = StructuredConsoleEncoder::new("{m}");
        let mut writer = SimpleWriter(Vec::new());

        let kvs = [("task", 7i64)];
        encoder
            .encode(
                &mut writer,
                &Record::builder()
                    .level(Level::Info)
                    .args(format_args!("transform settled"))
                    .key_values(&kvs)
                    .build(),
            )
            .unwrap();

        let line = String::from_utf8(writer.0).unwrap();
        assert!(line.starts_with("transform settled"));
        assert!(line.contains("task=7"));
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn plain_records_get_only_the_pattern_and_newline() {
        let encoder = StructuredConsoleEncoder::new("{m}");
        let mut writer = SimpleWriter(Vec::new());

        encoder
            .encode(
                &mut writer,
                &Record::builder()
                    .level(Level::Warn)
                    .args(format_args!("no context here"))
                    .build(),
            )
            .unwrap();

        assert_eq!(String::from_utf8(writer.0).unwrap(), "no context here\n");
    }
}
