//! One-off requests: `get`, `delete`, `post`, `put`, `patch`.

use std::io::Read;

use serde_json::Value;
use tracing::debug;

use lifeboard_core::{Method, RequestOptions};

use super::Session;
use crate::cli::{BodyArgs, GlobalOpts, PathArgs};
use crate::error::CliError;
use crate::output;

pub async fn get(args: PathArgs, global: &GlobalOpts) -> Result<(), CliError> {
    perform(Method::GET, &args.path, None, args.public, global).await
}

pub async fn delete(args: PathArgs, global: &GlobalOpts) -> Result<(), CliError> {
    perform(Method::DELETE, &args.path, None, args.public, global).await
}

pub async fn send(method: Method, args: BodyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let body = read_body(&args)?;
    perform(method, &args.path, body, args.public, global).await
}

async fn perform(
    method: Method,
    path: &str,
    body: Option<Value>,
    public: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let session = Session::open(global)?;
    if !public {
        session.login().await?;
    }

    debug!(%method, path, "sending request");
    let options = RequestOptions::default().auth(!public);
    let response: Value = session
        .client
        .request(method, path, body.as_ref(), &options)
        .await
        .map_err(|e| session.fail(e))?;

    let out = output::render(session.resolved.output, &response)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// `--data` wins over `--data-file`; `-` reads stdin.
fn read_body(args: &BodyArgs) -> Result<Option<Value>, CliError> {
    let raw = match (&args.data, &args.data_file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => return Ok(None),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Write;

    use serde_json::json;

    use super::*;

    fn body_args(data: Option<&str>, data_file: Option<std::path::PathBuf>) -> BodyArgs {
        BodyArgs {
            path: "habits".into(),
            data: data.map(ToOwned::to_owned),
            data_file,
            public: false,
        }
    }

    #[test]
    fn inline_body_is_parsed() {
        let body = read_body(&body_args(Some(r#"{"name":"Read"}"#), None)).unwrap();
        assert_eq!(body, Some(json!({ "name": "Read" })));
    }

    #[test]
    fn file_body_is_parsed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[1, 2, 3]"#).unwrap();
        let body = read_body(&body_args(None, Some(file.path().to_path_buf()))).unwrap();
        assert_eq!(body, Some(json!([1, 2, 3])));
    }

    #[test]
    fn missing_body_sends_nothing() {
        assert_eq!(read_body(&body_args(None, None)).unwrap(), None);
    }

    #[test]
    fn malformed_body_is_a_usage_error() {
        let err = read_body(&body_args(Some("{not json"), None)).unwrap_err();
        assert!(matches!(err, CliError::Json(_)));
        assert_eq!(err.exit_code(), crate::error::exit_code::USAGE);
    }
}
