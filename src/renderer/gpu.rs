use anyhow::anyhow;
use wgpu::{Adapter, Device, Instance, Queue, Surface};

pub struct GpuContext {
    pub instance: Instance,
    pub adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
}

impl GpuContext {
    /// Pick an adapter able to present to `surface` and open a device on it.
    pub async fn new(instance: Instance, surface: &Surface<'_>) -> crate::Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                force_fallback_adapter: false,
                compatible_surface: Some(surface),
            })
            .await
            .ok_or_else(|| anyhow!("Failed to find adapter"))?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default(), None)
            .await?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }
}
