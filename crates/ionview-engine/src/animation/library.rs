use std::collections::HashMap;

use super::clip::AnimationClip;

/// Name-keyed clip collection preserving source order.
///
/// Unnamed clips are registered as `clip{index}`. When names collide, later
/// clips get an index suffix so every clip stays addressable.
#[derive(Debug, Clone, Default)]
pub struct ClipLibrary {
    clips: Vec<AnimationClip>,
    by_name: HashMap<String, usize>,
}

impl ClipLibrary {
    pub fn new(clips: Vec<AnimationClip>) -> Self {
        let mut lib = Self::default();
        for clip in clips {
            lib.insert(clip);
        }
        lib
    }

    /// Adds a clip and returns its index.
    pub fn insert(&mut self, mut clip: AnimationClip) -> usize {
        let index = self.clips.len();

        let mut name = clip.name().trim().to_string();
        if name.is_empty() {
            name = format!("clip{index}");
        }
        if self.by_name.contains_key(&name) {
            let renamed = format!("{name}#{index}");
            log::warn!("duplicate clip name '{name}'; registered as '{renamed}'");
            name = renamed;
        }
        if name != clip.name() {
            clip.rename(name.clone());
        }

        self.by_name.insert(name, index);
        self.clips.push(clip);
        index
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&AnimationClip> {
        self.index_of(name).and_then(|i| self.clips.get(i))
    }

    pub fn get_index(&self, index: usize) -> Option<&AnimationClip> {
        self.clips.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Clip names in source order.
    pub fn names(&self) -> Vec<String> {
        self.clips.iter().map(|c| c.name().to_string()).collect()
    }

    /// Runs [`AnimationClip::optimize`] on every clip. Returns keys removed.
    pub fn optimize_all(&mut self) -> usize {
        self.clips.iter_mut().map(AnimationClip::optimize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_and_index() {
        let lib = ClipLibrary::new(vec![
            AnimationClip::new("Idle", vec![]),
            AnimationClip::new("Spin", vec![]),
        ]);
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.index_of("Spin"), Some(1));
        assert_eq!(lib.get("Idle").map(|c| c.name()), Some("Idle"));
        assert!(lib.get("Missing").is_none());
    }

    #[test]
    fn unnamed_and_duplicate_clips_stay_addressable() {
        let lib = ClipLibrary::new(vec![
            AnimationClip::new("", vec![]),
            AnimationClip::new("Run", vec![]),
            AnimationClip::new("Run", vec![]),
        ]);
        assert_eq!(lib.names(), vec!["clip0", "Run", "Run#2"]);
        assert_eq!(lib.index_of("Run"), Some(1));
        assert_eq!(lib.index_of("Run#2"), Some(2));
    }
}
