//! Loading a [`TaskRequest`] from a YAML file and the environment.
//!
//! Later sources win: defaults, the file, `MPC_` environment variables
//! (nested keys separated by `__`, e.g. `MPC_TASK_INFO__REQUEST_ID`), and
//! finally an explicit party name.

use crate::{
    context::{random_id, TaskRequest},
    error::Result,
};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use log::debug;
use std::{io, path::Path};

pub const ENV_PREFIX: &str = "MPC_";

pub fn load_task_request(path: Option<&Path>, party_name: Option<&str>) -> Result<TaskRequest> {
    let mut figment = Figment::from(Serialized::defaults(TaskRequest::default()));
    if let Some(path) = path {
        if !path.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("config file {} not found", path.display()),
            )
            .into());
        }
        debug!("loading task request from {}", path.display());
        figment = figment.merge(Yaml::file(path));
    }
    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
    if let Some(party_name) = party_name {
        figment = figment.merge(Serialized::default("party_name", party_name));
    }

    let mut request: TaskRequest = figment.extract()?;
    if request.task_info.request_id.is_empty() {
        request.task_info.request_id = random_id();
    }
    request.validate()?;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, types::Id};
    use figment::Jail;

    const CONFIG: &str = r#"
task_info:
  request_id: "req-42"
  task_id: "stats"
party_name: "alice"
party_access_info:
  alice:
    ip: "127.0.0.1"
    port: 50050
    party_id: 0
  bob:
    ip: "127.0.0.1"
    port: 50051
    party_id: 1
"#;

    fn load(path: Option<&str>, party: Option<&str>) -> figment::error::Result<TaskRequest> {
        load_task_request(path.map(Path::new), party).map_err(|e| e.to_string().into())
    }

    #[test]
    fn from_file() {
        Jail::expect_with(|jail| {
            jail.create_file("task.yaml", CONFIG)?;
            let request = load(Some("task.yaml"), None)?;
            assert_eq!(request.task_info.request_id, "req-42");
            assert_eq!(request.party_name, "alice");
            assert_eq!(request.party_id().unwrap(), Id::Party0);
            assert_eq!(request.node("bob").unwrap().port, 50051);
            Ok(())
        });
    }

    #[test]
    fn env_and_cli_override_file() {
        Jail::expect_with(|jail| {
            jail.create_file("task.yaml", CONFIG)?;
            jail.set_env("MPC_TASK_INFO__REQUEST_ID", "from-env");
            jail.set_env("MPC_PARTY_NAME", "bob");
            let request = load(Some("task.yaml"), None)?;
            assert_eq!(request.task_info.request_id, "from-env");
            assert_eq!(request.party_name, "bob");

            let request = load(Some("task.yaml"), Some("alice"))?;
            assert_eq!(request.party_name, "alice");
            Ok(())
        });
    }

    #[test]
    fn missing_request_id_is_generated() {
        Jail::expect_with(|jail| {
            jail.create_file("task.yaml", &CONFIG.replace("request_id: \"req-42\"", ""))?;
            let request = load(Some("task.yaml"), None)?;
            assert_eq!(request.task_info.request_id.len(), 32);
            Ok(())
        });
    }

    #[test]
    fn invalid_config() {
        Jail::expect_with(|jail| {
            jail.create_file("task.yaml", CONFIG)?;
            let res = load_task_request(Some(Path::new("task.yaml")), Some("carol"));
            assert!(matches!(res, Err(Error::UnknownParty(_))));

            let res = load_task_request(Some(Path::new("missing.yaml")), None);
            assert!(matches!(res, Err(Error::Io(_))));

            jail.create_file("broken.yaml", "party_access_info: 3")?;
            let res = load_task_request(Some(Path::new("broken.yaml")), None);
            assert!(matches!(res, Err(Error::Config(_))));
            Ok(())
        });
    }
}
