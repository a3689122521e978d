use crate::animation::{AnimationClip, Channel, Interpolation, Keyframes};

/// Reads every animation of `gltf` into a clip, keeping the declaration order.
pub fn load_clips(gltf: &gltf::Document, buffer_data: &[Vec<u8>]) -> Vec<AnimationClip> {
    gltf.animations()
        .map(|animation| {
            let name = animation
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("animation_{}", animation.index()));
            let channels = animation
                .channels()
                .filter_map(|channel| load_channel(&channel, buffer_data))
                .collect();
            AnimationClip::new(&name, channels)
        })
        .collect()
}

fn load_channel(channel: &gltf::animation::Channel, buffer_data: &[Vec<u8>]) -> Option<Channel> {
    let reader = channel.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));
    let timestamps: Vec<f32> = match reader.read_inputs() {
        Some(inputs) => inputs.collect(),
        None => {
            log::warn!("No keyframe times found in channel {}", channel.index());
            return None;
        }
    };
    let keyframes = match reader.read_outputs() {
        Some(gltf::animation::util::ReadOutputs::Translations(translations)) => {
            Keyframes::Translation(translations.map(Into::into).collect())
        }
        Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => Keyframes::Rotation(
            rotations
                .into_f32()
                // glTF stores quaternions as [x, y, z, w]
                .map(|[x, y, z, w]| cgmath::Quaternion::new(w, x, y, z))
                .collect(),
        ),
        Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
            Keyframes::Scale(scales.map(Into::into).collect())
        }
        // TODO: implement morphing
        Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(_)) => {
            log::warn!(
                "Skipping morph target channel {} of node {}",
                channel.index(),
                channel.target().node().index()
            );
            return None;
        }
        None => {
            log::warn!("No keyframes found in channel {}", channel.index());
            return None;
        }
    };
    let interpolation = match channel.sampler().interpolation() {
        gltf::animation::Interpolation::Step => Interpolation::Step,
        gltf::animation::Interpolation::Linear => Interpolation::Linear,
        gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
    };
    Some(Channel {
        target: channel.target().node().index(),
        interpolation,
        timestamps,
        keyframes,
    })
}
