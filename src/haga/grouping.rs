//! Dependency-closed application groups.

use crate::model::Application;

/// Partitions applications into dependency-closed groups.
///
/// Connected components of the undirected dependency graph are never split.
/// Components are taken in order of their highest priority (then lowest
/// index) and packed into groups of up to `group_size` applications; a
/// component larger than `group_size` forms a group of its own. Indices
/// inside a group are ascending.
///
/// Dependency indices out of range are ignored.
pub fn partition_groups(apps: &[Application], group_size: usize) -> Vec<Vec<usize>> {
    let n = apps.len();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for (i, app) in apps.iter().enumerate() {
        for dep in app.depend.iter().filter(|d| d.app_idx < n) {
            let (a, b) = (find(&mut parent, i), find(&mut parent, dep.app_idx));
            if a != b {
                parent[a.max(b)] = a.min(b);
            }
        }
    }

    let mut components: Vec<Vec<usize>> = Vec::new();
    let mut slot = vec![usize::MAX; n];
    for i in 0..n {
        let root = find(&mut parent, i);
        if slot[root] == usize::MAX {
            slot[root] = components.len();
            components.push(Vec::new());
        }
        components[slot[root]].push(i);
    }

    let top = |c: &Vec<usize>| c.iter().map(|&i| apps[i].priority).max().unwrap_or(0);
    components.sort_by(|a, b| top(b).cmp(&top(a)).then(a[0].cmp(&b[0])));

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    for component in components {
        if !current.is_empty() && current.len() + component.len() > group_size {
            current.sort_unstable();
            groups.push(std::mem::take(&mut current));
        }
        current.extend(component);
    }
    if !current.is_empty() {
        current.sort_unstable();
        groups.push(current);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dependence, TaskRequest};

    fn task(priority: u32) -> Application {
        Application::task("t", priority, TaskRequest::default())
    }

    #[test]
    fn test_components_stay_together() {
        let apps = vec![
            task(5).with_depend(vec![Dependence::on(2)]),
            task(9),
            task(7),
            task(3).with_depend(vec![Dependence::on(1)]),
            task(1).with_depend(vec![Dependence::on(0)]),
        ];
        let groups = partition_groups(&apps, 2);
        // components {1,3} (top 9) and {0,2,4} (top 7)
        assert_eq!(groups, vec![vec![1, 3], vec![0, 2, 4]]);
    }

    #[test]
    fn test_packs_up_to_group_size() {
        let apps: Vec<Application> = (1..=5).map(task).collect();
        let groups = partition_groups(&apps, 2);
        assert_eq!(groups, vec![vec![3, 4], vec![1, 2], vec![0]]);
        assert_eq!(partition_groups(&apps, 10).len(), 1);
    }

    #[test]
    fn test_every_app_in_exactly_one_group() {
        let apps: Vec<Application> = (1..=9)
            .map(|p| {
                let t = task(p * 2);
                if p > 1 && p % 2 == 1 {
                    t.with_depend(vec![Dependence::on(p as usize - 2)])
                } else {
                    t
                }
            })
            .collect();
        let mut all: Vec<usize> = partition_groups(&apps, 3).into_iter().flatten().collect();
        all.sort_unstable();
        assert_eq!(all, (0..9).collect::<Vec<_>>());
        assert!(partition_groups(&[], 3).is_empty());
    }
}
