//! Keyframe animation: clips, playable actions and the director that drives them.
//!
//! A glTF animation becomes one [`AnimationClip`] made of [`Channel`]s, each of which
//! animates the translation, rotation or scale of a single node. The
//! [`AnimationDirector`] wraps every clip into an [`AnimationAction`] that plays
//! once per trigger and writes the sampled transforms into the scene graph.

use std::ops::{Add, Mul};

use cgmath::{InnerSpace, Quaternion, Vector3};

use crate::data_structures::{instance::Instance, scene_graph::SceneNode};

#[derive(Clone, Debug)]
pub enum Keyframes {
    Translation(Vec<Vector3<f32>>),
    Rotation(Vec<Quaternion<f32>>),
    Scale(Vec<Vector3<f32>>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Interpolation {
    Step,
    #[default]
    Linear,
    /// Values are stored as `(in-tangent, value, out-tangent)` triples per keyframe.
    CubicSpline,
}

/// Keyframes for one property of one node.
#[derive(Clone, Debug)]
pub struct Channel {
    /// glTF index of the animated node.
    pub target: usize,
    pub interpolation: Interpolation,
    pub timestamps: Vec<f32>,
    pub keyframes: Keyframes,
}

/// A single sampled value of a [`Channel`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sample {
    Translation(Vector3<f32>),
    Rotation(Quaternion<f32>),
    Scale(Vector3<f32>),
}

impl Sample {
    pub fn apply(&self, transform: &mut Instance) {
        match *self {
            Sample::Translation(position) => transform.position = position,
            Sample::Rotation(rotation) => transform.rotation = rotation,
            Sample::Scale(scale) => transform.scale = scale,
        }
    }
}

impl Channel {
    /// Samples the channel at `time` seconds. Times outside the keyframe range clamp
    /// to the first or last keyframe. Returns `None` for empty channels.
    pub fn sample(&self, time: f32) -> Option<Sample> {
        match &self.keyframes {
            Keyframes::Translation(values) => {
                sample_values(&self.timestamps, values, self.interpolation, time, lerp)
                    .map(Sample::Translation)
            }
            Keyframes::Scale(values) => {
                sample_values(&self.timestamps, values, self.interpolation, time, lerp)
                    .map(Sample::Scale)
            }
            Keyframes::Rotation(values) => {
                sample_values(&self.timestamps, values, self.interpolation, time, slerp)
                    .map(|rotation| Sample::Rotation(rotation.normalize()))
            }
        }
    }

    pub fn duration(&self) -> f32 {
        self.timestamps.last().copied().unwrap_or(0.0)
    }
}

fn lerp(a: Vector3<f32>, b: Vector3<f32>, t: f32) -> Vector3<f32> {
    a + (b - a) * t
}

fn slerp(a: Quaternion<f32>, b: Quaternion<f32>, t: f32) -> Quaternion<f32> {
    // take the shorter arc
    let b = if a.dot(b) < 0.0 { -b } else { b };
    a.slerp(b, t)
}

fn sample_values<T>(
    timestamps: &[f32],
    values: &[T],
    interpolation: Interpolation,
    time: f32,
    mix: fn(T, T, f32) -> T,
) -> Option<T>
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    let stride = match interpolation {
        Interpolation::CubicSpline => 3,
        _ => 1,
    };
    let value_at = |k: usize| values.get(k * stride + stride / 2).copied();

    let last = timestamps.len().checked_sub(1)?;
    if time <= timestamps[0] {
        return value_at(0);
    }
    if time >= timestamps[last] {
        return value_at(last);
    }
    // first keyframe strictly after `time`, always in 1..=last here
    let next = timestamps.partition_point(|&t| t <= time);
    let prev = next - 1;
    let span = timestamps[next] - timestamps[prev];
    let s = if span > 0.0 {
        (time - timestamps[prev]) / span
    } else {
        0.0
    };

    match interpolation {
        Interpolation::Step => value_at(prev),
        Interpolation::Linear => Some(mix(value_at(prev)?, value_at(next)?, s)),
        Interpolation::CubicSpline => {
            let v0 = value_at(prev)?;
            let v1 = value_at(next)?;
            let out_tangent = *values.get(prev * 3 + 2)?;
            let in_tangent = *values.get(next * 3)?;
            let s2 = s * s;
            let s3 = s2 * s;
            Some(
                v0 * (2.0 * s3 - 3.0 * s2 + 1.0)
                    + out_tangent * ((s3 - 2.0 * s2 + s) * span)
                    + v1 * (-2.0 * s3 + 3.0 * s2)
                    + in_tangent * ((s3 - s2) * span),
            )
        }
    }
}

/// An animation clip: a named set of channels.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub channels: Vec<Channel>,
    pub duration: f32,
}

impl AnimationClip {
    /// The duration is the latest keyframe time of all channels.
    pub fn new(name: &str, channels: Vec<Channel>) -> Self {
        let duration = channels.iter().map(Channel::duration).fold(0.0, f32::max);
        Self {
            name: name.to_string(),
            channels,
            duration,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionState {
    Stopped,
    Playing,
    Finished,
}

/// A playable instance of a clip. Actions play once and then finish.
#[derive(Clone, Debug)]
pub struct AnimationAction {
    clip: usize,
    time: f32,
    state: ActionState,
    /// Keep the last pose once the action finished. When `false` the
    /// animated nodes return to their rest pose on the frame after the action ended.
    pub clamp_when_finished: bool,
}

impl AnimationAction {
    pub fn new(clip: usize) -> Self {
        Self {
            clip,
            time: 0.0,
            state: ActionState::Stopped,
            clamp_when_finished: false,
        }
    }

    pub fn clip(&self) -> usize {
        self.clip
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ActionState::Playing
    }

    /// Rewinds to the start and stops contributing to the pose.
    pub fn stop(&mut self) {
        self.time = 0.0;
        self.state = ActionState::Stopped;
    }

    /// Starts playing from the current time. Has no effect on an action that is
    /// already playing or that finished, call [`stop`](Self::stop) first to restart.
    pub fn play(&mut self) {
        if self.state == ActionState::Stopped {
            self.state = ActionState::Playing;
        }
    }

    /**
     * Advances the playback time by `dt` seconds.
     *
     * Returns whether the action contributes to the pose this frame. An action that
     * reaches `duration` is clamped to it, contributes one last time and becomes `Finished`.
     */
    fn advance(&mut self, dt: f32, duration: f32) -> bool {
        match self.state {
            ActionState::Stopped => false,
            ActionState::Finished => self.clamp_when_finished,
            ActionState::Playing => {
                self.time += dt;
                if self.time >= duration {
                    self.time = duration;
                    self.state = ActionState::Finished;
                }
                true
            }
        }
    }
}

/// Owns the clips of a loaded asset and one action per clip.
#[derive(Clone, Debug)]
pub struct AnimationDirector {
    clips: Vec<AnimationClip>,
    actions: Vec<AnimationAction>,
    rest_pose: Vec<(usize, Instance)>,
}

impl AnimationDirector {
    /// Builds one stopped, play-once action per clip, in clip order, and records the
    /// current local transform of every animated node in `scene` as its rest pose.
    pub fn new(clips: Vec<AnimationClip>, scene: &SceneNode) -> Self {
        let actions = (0..clips.len()).map(AnimationAction::new).collect();
        let mut rest_pose: Vec<(usize, Instance)> = Vec::new();
        for channel in clips.iter().flat_map(|clip| clip.channels.iter()) {
            if rest_pose.iter().any(|(idx, _)| *idx == channel.target) {
                continue;
            }
            match scene.find_by_index(channel.target) {
                Some(node) => rest_pose.push((channel.target, node.local)),
                None => log::warn!(
                    "animation targets node {} which is not part of the scene",
                    channel.target
                ),
            }
        }
        Self {
            clips,
            actions,
            rest_pose,
        }
    }

    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    pub fn actions(&self) -> &[AnimationAction] {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut [AnimationAction] {
        &mut self.actions
    }

    /// Restarts every action from time zero, in clip declaration order.
    pub fn replay_all(&mut self) {
        for action in self.actions.iter_mut() {
            action.stop();
            action.play();
        }
    }

    /// Advances all actions by `dt` seconds and writes the resulting pose into `scene`.
    pub fn update(&mut self, dt: f32, scene: &mut SceneNode) {
        for (idx, rest) in &self.rest_pose {
            if let Some(node) = scene.find_by_index_mut(*idx) {
                node.local = *rest;
            }
        }
        for action in self.actions.iter_mut() {
            let Some(clip) = self.clips.get(action.clip) else {
                continue;
            };
            if !action.advance(dt, clip.duration) {
                continue;
            }
            for channel in &clip.channels {
                let (Some(sample), Some(node)) = (
                    channel.sample(action.time),
                    scene.find_by_index_mut(channel.target),
                ) else {
                    continue;
                };
                sample.apply(&mut node.local);
            }
        }
    }
}
