use std::ffi::c_void;
use std::mem::transmute;

use ash::vk::{self, Handle};
use openxr as xr;

use crate::error::DisplayError;

/// Vulkan version requested from the runtime.
const TARGET_API_VERSION: xr::Version = xr::Version::new(1, 1, 0);

/// Vulkan instance and device created through `XR_KHR_vulkan_enable2`,
/// used only to bind an OpenXR session. The stereo image is drawn by wgpu.
pub struct VulkanBinding {
    // Keeps the loader alive for the instance and device below.
    _entry: ash::Entry,
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,
    device: ash::Device,
    queue_family_index: u32,
}

impl VulkanBinding {
    pub fn new(xr_instance: &xr::Instance, system: xr::SystemId) -> Result<Self, DisplayError> {
        let requirements = xr_instance.graphics_requirements::<xr::Vulkan>(system)?;
        if !api_version_supported(
            requirements.min_api_version_supported,
            requirements.max_api_version_supported,
        ) {
            let (min, max) = (
                requirements.min_api_version_supported,
                requirements.max_api_version_supported,
            );
            return Err(DisplayError::Vulkan(format!(
                "runtime needs Vulkan {}.{} to {}.x",
                min.major(),
                min.minor(),
                max.major()
            )));
        }

        let entry = ash::Entry::linked();
        // SAFETY: openxr and ash describe the same C signature for
        // vkGetInstanceProcAddr.
        let get_instance_proc_addr = unsafe {
            transmute::<vk::PFN_vkGetInstanceProcAddr, xr::sys::platform::VkGetInstanceProcAddr>(
                entry.static_fn().get_instance_proc_addr,
            )
        };

        let app_info = vk::ApplicationInfo::builder().api_version(vk::make_api_version(
            0,
            TARGET_API_VERSION.major() as u32,
            TARGET_API_VERSION.minor() as u32,
            0,
        ));
        let instance_info = vk::InstanceCreateInfo::builder().application_info(&app_info);

        // SAFETY: the create info outlives the call and the runtime
        // validates it before forwarding to the loader.
        let instance = unsafe {
            let raw = xr_instance
                .create_vulkan_instance(
                    system,
                    get_instance_proc_addr,
                    &*instance_info as *const _ as *const _,
                )?
                .map_err(vulkan_error)?;
            ash::Instance::load(entry.static_fn(), vk::Instance::from_raw(raw as _))
        };

        // SAFETY: the instance handle comes from the runtime above.
        let physical_device = unsafe {
            let raw = xr_instance.vulkan_graphics_device(system, instance.handle().as_raw() as _)?;
            vk::PhysicalDevice::from_raw(raw as _)
        };

        // SAFETY: the physical device belongs to `instance`.
        let families = unsafe { instance.get_physical_device_queue_family_properties(physical_device) };
        let Some(queue_family_index) = graphics_queue_family(&families) else {
            // SAFETY: nothing was created from the instance yet.
            unsafe { instance.destroy_instance(None) };
            return Err(DisplayError::Vulkan("no graphics queue family".to_string()));
        };

        let priorities = [1.0];
        let queue_info = [vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(queue_family_index)
            .queue_priorities(&priorities)
            .build()];
        let device_info = vk::DeviceCreateInfo::builder().queue_create_infos(&queue_info);

        // SAFETY: as for the instance above.
        let device = unsafe {
            let raw = xr_instance
                .create_vulkan_device(
                    system,
                    get_instance_proc_addr,
                    physical_device.as_raw() as _,
                    &*device_info as *const _ as *const _,
                )
                .map_err(DisplayError::from)
                .and_then(|created| created.map_err(vulkan_error));
            match raw {
                Ok(raw) => ash::Device::load(instance.fp_v1_0(), vk::Device::from_raw(raw as _)),
                Err(e) => {
                    instance.destroy_instance(None);
                    return Err(e);
                }
            }
        };

        log::info!("Created Vulkan device for OpenXR (queue family {})", queue_family_index);

        Ok(Self {
            _entry: entry,
            instance,
            physical_device,
            device,
            queue_family_index,
        })
    }

    pub fn session_create_info(&self) -> xr::vulkan::SessionCreateInfo {
        xr::vulkan::SessionCreateInfo {
            instance: self.instance.handle().as_raw() as *const c_void,
            physical_device: self.physical_device.as_raw() as *const c_void,
            device: self.device.handle().as_raw() as *const c_void,
            queue_family_index: self.queue_family_index,
            queue_index: 0,
        }
    }
}

impl Drop for VulkanBinding {
    fn drop(&mut self) {
        // SAFETY: the session using these handles is dropped first.
        unsafe {
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

fn vulkan_error(raw: i32) -> DisplayError {
    DisplayError::Vulkan(vk::Result::from_raw(raw).to_string())
}

fn api_version_supported(min: xr::Version, max: xr::Version) -> bool {
    min <= TARGET_API_VERSION && TARGET_API_VERSION.major() <= max.major()
}

fn graphics_queue_family(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    families
        .iter()
        .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
        .map(|index| index as u32)
}
