// ABOUTME: Chooses which platform executes a deploy: legacy releases or machines.
// ABOUTME: An ordered rule table over the app's history, force flags, and org default.

use crate::api::AppSummary;
use crate::config::Platform;

/// Everything backend selection looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionState {
    pub never_deployed: bool,
    pub force_releases: bool,
    pub force_machines: bool,
    pub recorded_platform: Option<Platform>,
    pub org_default_on: bool,
}

type Rule = (fn(&SelectionState) -> bool, fn(&SelectionState) -> Platform);

/// First match wins. The last rule always matches.
const RULES: &[Rule] = &[
    (new_and_forced_releases, releases),
    (new_and_forced_machines, machines),
    (new_and_recorded_machines, machines),
    (deployed_before, recorded_or_releases),
    (always, org_default),
];

fn new_and_forced_releases(s: &SelectionState) -> bool {
    s.never_deployed && s.force_releases
}

fn new_and_forced_machines(s: &SelectionState) -> bool {
    s.never_deployed && s.force_machines
}

fn new_and_recorded_machines(s: &SelectionState) -> bool {
    s.never_deployed && s.recorded_platform == Some(Platform::Machines)
}

fn deployed_before(s: &SelectionState) -> bool {
    !s.never_deployed
}

fn always(_: &SelectionState) -> bool {
    true
}

fn releases(_: &SelectionState) -> Platform {
    Platform::Releases
}

fn machines(_: &SelectionState) -> Platform {
    Platform::Machines
}

fn recorded_or_releases(state: &SelectionState) -> Platform {
    state.recorded_platform.unwrap_or(Platform::Releases)
}

fn org_default(state: &SelectionState) -> Platform {
    if state.org_default_on {
        Platform::Machines
    } else {
        Platform::Releases
    }
}

impl SelectionState {
    pub fn from_summary(
        summary: &AppSummary,
        force_releases: bool,
        force_machines: bool,
        org_default_on: bool,
    ) -> Self {
        Self {
            never_deployed: !summary.deployed,
            force_releases,
            force_machines,
            recorded_platform: summary.platform_version,
            org_default_on,
        }
    }

    pub fn decide(&self) -> Platform {
        RULES
            .iter()
            .find(|(applies, _)| applies(self))
            .map(|(_, outcome)| outcome(self))
            .unwrap_or_else(|| org_default(self))
    }
}

/// Pick the platform for this deploy.
///
/// Apps that were deployed before stay on their recorded platform regardless
/// of force flags. `auto_confirm` does not influence the outcome.
pub fn select_backend(
    summary: &AppSummary,
    force_releases: bool,
    force_machines: bool,
    auto_confirm: bool,
    org_default_on: bool,
) -> Platform {
    let state = SelectionState::from_summary(summary, force_releases, force_machines, org_default_on);
    let platform = state.decide();
    tracing::debug!(
        app = %summary.name,
        ?state,
        auto_confirm,
        platform = %platform,
        "selected deploy platform"
    );
    platform
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(never_deployed: bool, recorded: Option<Platform>) -> SelectionState {
        SelectionState {
            never_deployed,
            force_releases: false,
            force_machines: false,
            recorded_platform: recorded,
            org_default_on: false,
        }
    }

    #[test]
    fn release_force_beats_machines_force_for_new_apps() {
        let s = SelectionState {
            force_releases: true,
            force_machines: true,
            ..state(true, None)
        };
        assert_eq!(s.decide(), Platform::Releases);
    }

    #[test]
    fn new_app_recorded_as_machines_stays_on_machines() {
        assert_eq!(state(true, Some(Platform::Machines)).decide(), Platform::Machines);
    }

    #[test]
    fn new_app_falls_back_to_org_default() {
        assert_eq!(state(true, None).decide(), Platform::Releases);
        let on = SelectionState {
            org_default_on: true,
            ..state(true, None)
        };
        assert_eq!(on.decide(), Platform::Machines);
    }

    #[test]
    fn deployed_app_keeps_recorded_platform() {
        let s = SelectionState {
            force_machines: true,
            org_default_on: true,
            ..state(false, Some(Platform::Releases))
        };
        assert_eq!(s.decide(), Platform::Releases);
    }
}
