//! Client/server version comparison for `pgo version` output.
//!
//! The tool prints two lines, for example:
//!
//! ```text
//! pgo client version 4.0.1
//! pgo-apiserver version 4.0.1
//! ```
//!
//! The client token is the fourth whitespace-delimited field of the first
//! line and the server token the third field of the second line.

use thiserror::Error;

const CLIENT_FIELD: usize = 3;
const SERVER_FIELD: usize = 2;

/// Errors raised when version output does not show matching versions.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum VersionError {
    /// Raised when the command printed nothing.
    #[error("command returned nothing to stdout")]
    Empty,
    /// Raised when the output does not have exactly two lines.
    #[error("expected command to return 2 lines, it returned {0}")]
    LineCount(usize),
    /// Raised when a line is too short to hold its version token.
    #[error("{side} version line has no field {field}: {line}")]
    MissingField {
        /// `client` or `server`.
        side: &'static str,
        /// 1-based field position that was expected.
        field: usize,
        /// Offending line.
        line: String,
    },
    /// Raised when the two versions differ.
    #[error("client/server version mismatch: client ({client}) and server ({server})")]
    Mismatch {
        /// Version reported by the client.
        client: String,
        /// Version reported by the server.
        server: String,
    },
}

/// Checks that client and server report the same version.
///
/// Returns the shared version on success.
///
/// # Errors
///
/// Returns [`VersionError`] when stdout is absent or empty, is not two lines
/// after trimming one trailing newline, lacks a version field, or reports
/// different versions.
pub fn compare_client_server(stdout: Option<&str>) -> Result<String, VersionError> {
    let text = stdout.filter(|text| !text.is_empty()).ok_or(VersionError::Empty)?;
    let trimmed = text.strip_suffix('\n').unwrap_or(text);
    let lines: Vec<&str> = trimmed.split('\n').collect();
    let [client_line, server_line] = lines.as_slice() else {
        return Err(VersionError::LineCount(lines.len()));
    };

    let client = version_token(client_line, CLIENT_FIELD, "client")?;
    let server = version_token(server_line, SERVER_FIELD, "server")?;
    if client != server {
        return Err(VersionError::Mismatch {
            client: client.to_owned(),
            server: server.to_owned(),
        });
    }
    Ok(client.to_owned())
}

fn version_token<'a>(
    line: &'a str,
    index: usize,
    side: &'static str,
) -> Result<&'a str, VersionError> {
    line.split_whitespace()
        .nth(index)
        .ok_or_else(|| VersionError::MissingField {
            side,
            field: index + 1,
            line: line.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn matching_versions_pass() {
        let version =
            compare_client_server(Some("client version buildSHA v1.2.3\nserver version v1.2.3\n"))
                .expect("versions should match");
        assert_eq!(version, "v1.2.3");
    }

    #[rstest]
    fn real_tool_output_passes() {
        let stdout = "pgo client version 4.0.1\npgo-apiserver version 4.0.1\n";
        assert_eq!(compare_client_server(Some(stdout)), Ok(String::from("4.0.1")));
    }

    #[rstest]
    fn mismatched_versions_fail_explicitly() {
        let err =
            compare_client_server(Some("client version buildSHA v1.2.3\nserver version v1.2.4\n"))
                .expect_err("versions differ");
        assert_eq!(
            err,
            VersionError::Mismatch {
                client: String::from("v1.2.3"),
                server: String::from("v1.2.4"),
            }
        );
        assert!(err.to_string().contains("mismatch"));
    }

    #[rstest]
    #[case("only one line\n", 1)]
    #[case("a b c d\ne f g\nh i j\n", 3)]
    #[case("a b c d\ne f g\n\n", 3)]
    fn wrong_line_count_fails(#[case] stdout: &str, #[case] expected: usize) {
        assert_eq!(
            compare_client_server(Some(stdout)),
            Err(VersionError::LineCount(expected))
        );
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    fn missing_output_fails(#[case] stdout: Option<&str>) {
        assert_eq!(compare_client_server(stdout), Err(VersionError::Empty));
    }

    #[rstest]
    fn short_line_reports_missing_field() {
        let err = compare_client_server(Some("pgo client\npgo-apiserver version 4.0.1"))
            .expect_err("client line too short");
        assert!(
            matches!(err, VersionError::MissingField { side: "client", field: 4, .. }),
            "unexpected error: {err:?}"
        );
    }
}
