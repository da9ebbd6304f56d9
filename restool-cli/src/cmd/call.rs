use serde_json::{Map, Value};

use crate::cmd::config::{start_runtime, tool_error_code};
use crate::exit_codes;
use crate::output::{print_error, print_result};
use crate::{OutputArgs, RuntimeArgs};

pub async fn call_cmd(
    name: &str,
    pairs: &[String],
    args_json: Option<&str>,
    runtime: RuntimeArgs,
    output: OutputArgs,
) -> i32 {
    let args = match collect_args(pairs, args_json) {
        Ok(args) => args,
        Err(msg) => {
            print_error(output.format, output.quiet, &msg);
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let rt = match start_runtime(&runtime, &output) {
        Ok(rt) => rt,
        Err(code) => return code,
    };

    let code = match rt.execute(name, &args).await {
        Ok(response) => {
            print_result(output.format, output.quiet, &response);
            if response.is_success() {
                exit_codes::SUCCESS
            } else {
                exit_codes::CALL_FAILED
            }
        }
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            tool_error_code(&e)
        }
    };
    rt.shutdown().await;
    code
}

fn collect_args(pairs: &[String], args_json: Option<&str>) -> Result<Map<String, Value>, String> {
    let mut args = match args_json {
        Some(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err("--args-json must be a JSON object".to_string()),
            Err(e) => return Err(format!("invalid --args-json: {e}")),
        },
        None => Map::new(),
    };
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            return Err(format!("invalid --arg '{pair}': expected KEY=VALUE"));
        };
        if key.is_empty() {
            return Err(format!("invalid --arg '{pair}': empty key"));
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        args.insert(key.to_string(), value);
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_are_json_when_they_parse() {
        let args = collect_args(
            &[
                "id=7".to_string(),
                "name=Rex".to_string(),
                "tags=[\"a\"]".to_string(),
                "note=a=b".to_string(),
            ],
            None,
        )
        .unwrap();
        assert_eq!(args["id"], json!(7));
        assert_eq!(args["name"], json!("Rex"));
        assert_eq!(args["tags"], json!(["a"]));
        assert_eq!(args["note"], json!("a=b"));
    }

    #[test]
    fn pairs_override_the_json_object() {
        let args = collect_args(&["id=2".to_string()], Some(r#"{"id": 1, "x": true}"#)).unwrap();
        assert_eq!(Value::Object(args), json!({"id": 2, "x": true}));
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(collect_args(&["novalue".to_string()], None).is_err());
        assert!(collect_args(&["=1".to_string()], None).is_err());
        assert!(collect_args(&[], Some("[1]")).is_err());
        assert!(collect_args(&[], Some("{")).is_err());
    }
}
