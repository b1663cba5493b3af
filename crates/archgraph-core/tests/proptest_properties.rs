use archgraph_core::graph::find_cycles;
use archgraph_core::grouping::{GroupingKey, applications_by_group, grouped_dependencies};
use archgraph_core::model::Status;
use archgraph_core::subview::SubView;
use proptest::prelude::*;

#[path = "generators.rs"]
mod generators;
use generators::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn acyclic_graphs_report_no_cycles(project in arb_dag(16)) {
        prop_assert!(find_cycles(&project).is_empty());
    }

    #[test]
    fn ring_is_found_regardless_of_declaration_order(
        order in (2usize..9).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
    ) {
        let n = order.len();
        // Ring member i depends on member i + 1; declaration order is shuffled.
        let apps = order
            .iter()
            .map(|&member| raw_app(member, "", "", Status::Active, vec![app_id((member + 1) % n)]))
            .collect();
        let project = project_from(apps);

        let mut expected: Vec<String> = (0..n).map(app_id).collect();
        expected.sort();
        let found = find_cycles(&project).into_iter().any(|cycle| {
            let mut members = cycle.members.clone();
            members.sort();
            members == expected
        });
        prop_assert!(found);
    }

    #[test]
    fn reported_cycles_are_closed_loops(project in arb_project(12)) {
        for cycle in find_cycles(&project) {
            let n = cycle.len();
            prop_assert!(n > 0);
            for i in 0..n {
                let from = project.application(&cycle.members[i]).expect("member exists");
                prop_assert!(from.depends_on(&cycle.members[(i + 1) % n]));
            }
        }
    }

    #[test]
    fn applications_by_group_is_a_partition(project in arb_project(20)) {
        let tree = applications_by_group(&project);
        let mut placed: Vec<&str> = tree.all_applications();
        placed.sort_unstable();
        let mut ids: Vec<&str> = project.applications().iter().map(|a| a.id.as_str()).collect();
        ids.sort_unstable();
        prop_assert_eq!(placed, ids);
    }

    #[test]
    fn grouped_dependencies_are_exhaustive(project in arb_project(12), by_relation in any::<bool>()) {
        let key = if by_relation { GroupingKey::Relation } else { GroupingKey::Group };
        for app in project.applications() {
            let mut bucketed: Vec<String> = grouped_dependencies(&project, app, key)
                .into_iter()
                .flat_map(|b| b.dependencies.into_iter().map(|d| d.target))
                .collect();
            bucketed.sort();
            let mut declared: Vec<String> = app.dependency_targets().map(str::to_string).collect();
            declared.sort();
            prop_assert_eq!(bucketed, declared);
        }
    }

    #[test]
    fn subview_keeps_exactly_the_included_applications(
        project in arb_project(20),
        group in 0..GROUPS.len(),
        team in 0..TEAMS.len(),
        exclude in 0usize..20,
    ) {
        let (group, team, excluded) = (GROUPS[group], TEAMS[team], app_id(exclude));
        let mut view = SubView::named("generated");
        if !group.is_empty() {
            view.include_groups.push(group.to_string());
        }
        if !team.is_empty() {
            view.include_teams.push(team.to_string());
        }
        view.exclude_applications.push(excluded.clone());

        let in_group = |app_group: Option<&str>| {
            !group.is_empty()
                && app_group.is_some_and(|g| {
                    g == group || g.strip_prefix(group).is_some_and(|rest| rest.starts_with('/'))
                })
        };
        let in_team = |app_team: Option<&str>| !team.is_empty() && app_team == Some(team);
        let unfiltered = group.is_empty() && team.is_empty();

        let filtered = project.filtered(&view);
        let kept: Vec<&str> = filtered.applications().iter().map(|a| a.id.as_str()).collect();
        let expected: Vec<&str> = project
            .applications()
            .iter()
            .filter(|a| a.id != excluded)
            .filter(|a| unfiltered || in_group(a.group.as_deref()) || in_team(a.team.as_deref()))
            .map(|a| a.id.as_str())
            .collect();
        prop_assert_eq!(kept, expected);
    }
}
