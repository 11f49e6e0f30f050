//! Process identity collector (cross-platform via sysinfo).

use super::{ProcessEntry, ProcessSource};
use crate::error::{AccessError, CollectionError};
use sysinfo::{ProcessRefreshKind, System, ThreadKind, UpdateKind, Users};

pub struct SysinfoProcessSource {
    sys: System,
    users: Users,
}

impl Default for SysinfoProcessSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoProcessSource {
    pub fn new() -> Self {
        Self {
            sys: System::new(),
            users: Users::new_with_refreshed_list(),
        }
    }
}

impl ProcessSource for SysinfoProcessSource {
    fn processes(&mut self) -> Result<Vec<Result<ProcessEntry, AccessError>>, CollectionError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(CollectionError::Unsupported);
        }
        self.sys.refresh_processes_specifics(
            ProcessRefreshKind::new()
                .with_user(UpdateKind::OnlyIfNotSet)
                .with_cmd(UpdateKind::OnlyIfNotSet),
        );
        self.users.refresh_list();

        let mut out = Vec::with_capacity(self.sys.processes().len());
        for (pid, proc_) in self.sys.processes() {
            // Linux tasks show up alongside their process; only the group leader is a row
            if proc_.thread_kind() == Some(ThreadKind::Userland) {
                continue;
            }
            let owner = proc_
                .user_id()
                .and_then(|uid| self.users.iter().find(|u| u.id() == uid))
                .map(|u| u.name().to_string())
                .unwrap_or_default();
            out.push(Ok(ProcessEntry {
                pid: pid.as_u32(),
                name: proc_.name().to_string(),
                owner,
                cmdline: proc_.cmd().join(" "),
            }));
        }
        Ok(out)
    }
}
