//! Typed queries and actions on [`HyprClient`]
//!
//! Queries use Hyprland's `j/` prefix to get JSON back and decode it into the
//! records in [`crate::types`]. Actions are `dispatch <action> <args>`
//! commands; Hyprland answers `ok` on success and an error message otherwise.

use serde::de::DeserializeOwned;
use tracing::debug;

use super::{HyprClient, HyprError, Monitor, Window, Workspace};

/// Reply Hyprland sends for an accepted action
const ACTION_OK: &str = "ok";

impl HyprClient {
    /// Send a `j/` query and decode the JSON reply
    ///
    /// # Errors
    ///
    /// Returns any error from [`HyprClient::send_command`].
    /// Returns `HyprError::DeserializeFailed` if the reply is not the
    /// expected JSON shape.
    pub async fn query<T: DeserializeOwned>(&self, command: &str) -> Result<T, HyprError> {
        let reply = self.send_command(command).await?;

        serde_json::from_slice(&reply).map_err(|e| HyprError::DeserializeFailed {
            command: command.to_string(),
            source: e,
        })
    }

    pub async fn get_active_workspace(&self) -> Result<Workspace, HyprError> {
        self.query("j/activeworkspace").await
    }

    pub async fn get_workspaces(&self) -> Result<Vec<Workspace>, HyprError> {
        self.query("j/workspaces").await
    }

    /// Query the focused window
    ///
    /// Returns `Ok(None)` when nothing is focused; Hyprland replies with an
    /// empty object in that case.
    pub async fn get_active_window(&self) -> Result<Option<Window>, HyprError> {
        const COMMAND: &str = "j/activewindow";

        let value: serde_json::Value = self.query(COMMAND).await?;
        if value.as_object().is_some_and(|object| object.is_empty()) {
            return Ok(None);
        }

        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| HyprError::DeserializeFailed {
                command: COMMAND.to_string(),
                source: e,
            })
    }

    pub async fn get_windows(&self) -> Result<Vec<Window>, HyprError> {
        self.query("j/clients").await
    }

    pub async fn get_monitors(&self) -> Result<Vec<Monitor>, HyprError> {
        self.query("j/monitors").await
    }

    /// Query the monitor that currently has focus
    ///
    /// # Errors
    ///
    /// Returns `HyprError::NoFocusedMonitor` if no monitor is flagged focused.
    pub async fn get_active_monitor(&self) -> Result<Monitor, HyprError> {
        self.get_monitors()
            .await?
            .into_iter()
            .find(|monitor| monitor.focused)
            .ok_or(HyprError::NoFocusedMonitor)
    }

    /// Run `dispatch <action> <args>`
    ///
    /// `args` may be empty for dispatchers that take none.
    ///
    /// # Errors
    ///
    /// Returns any error from [`HyprClient::send_command`].
    /// Returns `HyprError::CommandRejected` if Hyprland does not answer `ok`.
    pub async fn dispatch(&self, action: &str, args: &str) -> Result<(), HyprError> {
        let command = if args.is_empty() {
            format!("dispatch {}", action)
        } else {
            format!("dispatch {} {}", action, args)
        };

        let reply = self.send_command(&command).await?;
        let message = String::from_utf8_lossy(&reply).trim().to_string();

        if message == ACTION_OK {
            debug!(command, "Hyprland action accepted");
            Ok(())
        } else {
            Err(HyprError::CommandRejected { command, message })
        }
    }

    pub async fn switch_workspace(&self, id: i64) -> Result<(), HyprError> {
        self.dispatch("workspace", &id.to_string()).await
    }

    /// Switch to a named workspace, e.g. `web` or `special:scratch`
    pub async fn switch_workspace_by_name(&self, name: &str) -> Result<(), HyprError> {
        self.dispatch("workspace", &format!("name:{}", name)).await
    }

    /// Move the focused window to workspace `id`
    pub async fn move_to_workspace(&self, id: i64) -> Result<(), HyprError> {
        self.dispatch("movetoworkspace", &id.to_string()).await
    }

    pub async fn toggle_fullscreen(&self) -> Result<(), HyprError> {
        self.dispatch("fullscreen", "").await
    }

    pub async fn kill_active_window(&self) -> Result<(), HyprError> {
        self.dispatch("killactive", "").await
    }

    pub async fn toggle_floating(&self) -> Result<(), HyprError> {
        self.dispatch("togglefloating", "").await
    }

    pub async fn focus_monitor(&self, monitor: &str) -> Result<(), HyprError> {
        self.dispatch("focusmonitor", monitor).await
    }

    pub async fn move_workspace_to_monitor(
        &self,
        workspace: i64,
        monitor: &str,
    ) -> Result<(), HyprError> {
        self.dispatch("moveworkspacetomonitor", &format!("{} {}", workspace, monitor))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::tests::spawn_stub_command_server;
    use crate::Session;
    use tempfile::TempDir;

    fn client_with_reply(dir: &TempDir, reply: &str) -> (HyprClient, crate::command::tests::StubCommandServer) {
        let session = Session::with_socket_dir("abc123", dir.path()).unwrap();
        let server = spawn_stub_command_server(&session.command_socket(), reply.as_bytes().to_vec());
        (HyprClient::new(session), server)
    }

    const MONITORS: &str = r#"[
        {"id": 0, "name": "eDP-1", "focused": false, "activeWorkspace": {"id": 1, "name": "1"}},
        {"id": 1, "name": "DP-2", "focused": true, "activeWorkspace": {"id": 5, "name": "5"}}
    ]"#;

    #[tokio::test]
    async fn test_get_active_workspace_decodes_reply() {
        let temp_dir = TempDir::new().unwrap();
        let (client, server) = client_with_reply(
            &temp_dir,
            r#"{"id":3,"name":"3","monitor":"DP-1","monitorID":1,"windows":4,"hasfullscreen":true,"lastwindow":"0x5a1","lastwindowtitle":"htop"}"#,
        );

        let workspace = client.get_active_workspace().await.unwrap();

        assert_eq!(
            workspace,
            Workspace {
                id: 3,
                name: "3".to_string(),
                monitor: "DP-1".to_string(),
                monitor_id: 1,
                windows: 4,
                has_fullscreen: true,
                last_window: "0x5a1".to_string(),
                last_window_title: "htop".to_string(),
            }
        );
        assert_eq!(
            server.received.lock().unwrap().as_slice(),
            ["j/activeworkspace".to_string()]
        );
        server.handle.abort();
    }

    #[tokio::test]
    async fn test_get_active_monitor_picks_focused() {
        let temp_dir = TempDir::new().unwrap();
        let (client, server) = client_with_reply(&temp_dir, MONITORS);

        let monitor = client.get_active_monitor().await.unwrap();

        assert_eq!(monitor.name, "DP-2");
        assert_eq!(monitor.active_workspace.id, 5);
        assert_eq!(
            server.received.lock().unwrap().as_slice(),
            ["j/monitors".to_string()]
        );
        server.handle.abort();
    }

    #[tokio::test]
    async fn test_get_active_monitor_without_focus_fails() {
        let temp_dir = TempDir::new().unwrap();
        let (client, server) =
            client_with_reply(&temp_dir, r#"[{"id": 0, "name": "eDP-1", "focused": false}]"#);

        assert!(matches!(
            client.get_active_monitor().await,
            Err(HyprError::NoFocusedMonitor)
        ));
        server.handle.abort();
    }

    #[tokio::test]
    async fn test_get_active_window_empty_object_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let (client, server) = client_with_reply(&temp_dir, "{}");

        assert_eq!(client.get_active_window().await.unwrap(), None);
        server.handle.abort();
    }

    #[tokio::test]
    async fn test_get_active_window_decodes_window() {
        let temp_dir = TempDir::new().unwrap();
        let (client, server) = client_with_reply(
            &temp_dir,
            r#"{"address":"0x5a1","class":"kitty","title":"zsh","workspace":{"id":2,"name":"2"},"fullscreen":1}"#,
        );

        let window = client.get_active_window().await.unwrap().unwrap();
        assert_eq!(window.class, "kitty");
        assert!(window.fullscreen);
        server.handle.abort();
    }

    #[tokio::test]
    async fn test_list_queries_use_json_commands() {
        let temp_dir = TempDir::new().unwrap();
        let (client, server) = client_with_reply(&temp_dir, "[]");

        assert!(client.get_workspaces().await.unwrap().is_empty());
        assert!(client.get_windows().await.unwrap().is_empty());
        assert!(client.get_monitors().await.unwrap().is_empty());

        assert_eq!(
            server.received.lock().unwrap().as_slice(),
            [
                "j/workspaces".to_string(),
                "j/clients".to_string(),
                "j/monitors".to_string()
            ]
        );
        server.handle.abort();
    }

    #[tokio::test]
    async fn test_garbage_reply_is_deserialize_failure() {
        let temp_dir = TempDir::new().unwrap();
        let (client, server) = client_with_reply(&temp_dir, "unknown request");

        match client.get_workspaces().await {
            Err(HyprError::DeserializeFailed { command, .. }) => assert_eq!(command, "j/workspaces"),
            other => panic!("Expected DeserializeFailed, got: {:?}", other),
        }
        server.handle.abort();
    }

    #[tokio::test]
    async fn test_actions_send_dispatch_commands() {
        let temp_dir = TempDir::new().unwrap();
        let (client, server) = client_with_reply(&temp_dir, "ok");

        client.switch_workspace(3).await.unwrap();
        client.switch_workspace_by_name("web").await.unwrap();
        client.move_to_workspace(-98).await.unwrap();
        client.toggle_fullscreen().await.unwrap();
        client.kill_active_window().await.unwrap();
        client.toggle_floating().await.unwrap();
        client.focus_monitor("DP-2").await.unwrap();
        client.move_workspace_to_monitor(4, "HDMI-A-1").await.unwrap();

        assert_eq!(
            server.received.lock().unwrap().as_slice(),
            [
                "dispatch workspace 3",
                "dispatch workspace name:web",
                "dispatch movetoworkspace -98",
                "dispatch fullscreen",
                "dispatch killactive",
                "dispatch togglefloating",
                "dispatch focusmonitor DP-2",
                "dispatch moveworkspacetomonitor 4 HDMI-A-1",
            ]
            .map(String::from)
        );
        server.handle.abort();
    }

    #[tokio::test]
    async fn test_rejected_action_carries_message() {
        let temp_dir = TempDir::new().unwrap();
        let (client, server) = client_with_reply(&temp_dir, "Invalid dispatcher\n");

        match client.dispatch("nosuchthing", "").await {
            Err(HyprError::CommandRejected { command, message }) => {
                assert_eq!(command, "dispatch nosuchthing");
                assert_eq!(message, "Invalid dispatcher");
            }
            other => panic!("Expected CommandRejected, got: {:?}", other),
        }
        server.handle.abort();
    }

    #[tokio::test]
    async fn test_command_to_missing_session_is_connect_failure() {
        let temp_dir = TempDir::new().unwrap();
        let session = Session::with_socket_dir("abc123", temp_dir.path().join("gone")).unwrap();
        let client = HyprClient::new(session);

        assert!(matches!(
            client.get_monitors().await,
            Err(HyprError::ConnectFailure { .. })
        ));
    }
}
