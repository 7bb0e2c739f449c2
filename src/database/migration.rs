//! Embedded single-file migrations
//!
//! All schema migrations live in `sql/migrations.pg.sql` and are compiled into the binary.
//! A migration starts with a header line comment:
//! ```text
//! --##1 companies, entries, settings and users
//! ```
//! The number is the migration version, the rest of the line its description. Versions
//! must increase by one from migration to migration.
use std::{borrow::Cow, future::Future, pin::Pin};

use sqlx::{
    error::BoxDynError,
    migrate::{Migration, MigrationSource, MigrationType},
};

const HEADER_PREFIX: &str = "--##";

#[derive(Debug)]
pub struct MigrationScript<'s> {
    data: &'s str,
}

fn parse_header(line: &str) -> Result<(i64, String), String> {
    let header = &line[HEADER_PREFIX.len()..];
    let (version, description) = header.split_once(' ').unwrap_or((header, ""));
    let version = version.parse::<i64>().map_err(|e| {
        format!("invalid migration version '{version}' in header '{line}': {e}")
    })?;
    Ok((version, description.trim().to_owned()))
}

fn parse_script(data: &str) -> Result<Vec<Migration>, String> {
    let mut scripts: Vec<(i64, String, String)> = Vec::new();

    for line in data.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with(HEADER_PREFIX) {
            let (version, description) = parse_header(line)?;
            if let Some((previous, _, _)) = scripts.last() {
                if version != previous + 1 {
                    return Err(format!(
                        "migration {version} does not follow migration {previous}"
                    ));
                }
            }
            scripts.push((version, description, String::new()));
            continue;
        }

        match scripts.last_mut() {
            Some((_, _, sql)) => {
                sql.push_str(line);
                sql.push('\n');
            }
            // comments before the first header are allowed
            None if line.starts_with("--") => continue,
            None => {
                return Err(format!(
                    "migration script does not start with a migration header, got: {line}"
                ))
            }
        }
    }

    Ok(scripts
        .into_iter()
        .map(|(version, description, sql)| {
            Migration::new(
                version,
                Cow::Owned(description),
                MigrationType::Simple,
                Cow::Owned(sql),
            )
        })
        .collect())
}

impl<'s> MigrationSource<'s> for MigrationScript<'s> {
    fn resolve(
        self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Migration>, BoxDynError>> + Send + 's>> {
        Box::pin(async move { Ok(parse_script(self.data)?) })
    }
}

pub fn postgresql_migrations() -> MigrationScript<'static> {
    MigrationScript {
        data: include_str!("./sql/migrations.pg.sql"),
    }
}
